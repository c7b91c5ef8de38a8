//! Shared utilities for integration tests.

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use service_logging::{Environment, LogConfig, Logger};

/// Writer capturing everything a logger emits.
#[derive(Clone, Default)]
pub struct TestWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
    flushes: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl TestWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }

    /// Every line parsed as a JSON entry.
    pub fn entries(&self) -> Vec<Value> {
        self.output()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("log line is not JSON"))
            .collect()
    }

    /// Only the request completion entries.
    pub fn served(&self) -> Vec<Value> {
        self.entries()
            .into_iter()
            .filter(|entry| entry["message"] == "served")
            .collect()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .map_err(|_| io::Error::other("Mutex poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Logger configured as under `ENV=test`, writing into `writer`.
#[allow(dead_code)]
pub fn test_logger(writer: &TestWriter, service: &str, component: &str) -> Logger {
    Logger::builder(service)
        .component(component)
        .config(LogConfig {
            env: Environment::Test,
            debug: false,
            version: Some("v0.0.0-test".into()),
        })
        .writer(writer.clone())
        .build()
        .expect("failed to build test logger")
}

/// Logger configured as in production, writing into `writer`.
#[allow(dead_code)]
pub fn production_logger(writer: &TestWriter, debug: bool) -> Logger {
    Logger::builder("api")
        .config(LogConfig {
            env: Environment::Production("production".into()),
            debug,
            version: None,
        })
        .writer(writer.clone())
        .build()
        .expect("failed to build production logger")
}
