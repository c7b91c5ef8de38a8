//! Shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// Cancellation signal shared by the logger's teardown hook and the
/// service's long-running tasks.
///
/// Firing is one-shot: the first [`Shutdown::trigger`] wins and later calls
/// are no-ops. Clones observe the same signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    fired: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create a new, unfired shutdown signal.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the signal. Subscribe before checking
    /// [`Shutdown::is_triggered`] so a concurrent trigger cannot be missed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Returns `false` if it had already fired.
    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.tx.send(());
        true
    }

    /// Whether the signal has fired.
    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Wait until the signal fires.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        if self.is_triggered() {
            return;
        }
        let _ = rx.recv().await;
    }

    /// A receive-only handle. Unlike a clone it does not keep the signal
    /// alive, so it also wakes once every `Shutdown` has been dropped.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.subscribe(),
            fired: Arc::clone(&self.fired),
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive side of a [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownListener {
    rx: broadcast::Receiver<()>,
    fired: Arc<AtomicBool>,
}

impl ShutdownListener {
    /// Block the current (non-async) thread until the signal fires or every
    /// [`Shutdown`] handle is gone.
    pub fn wait_blocking(mut self) {
        if self.fired.load(Ordering::Acquire) {
            return;
        }
        let _ = self.rx.blocking_recv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_trigger_fires_once() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.clone().is_triggered());
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .expect("wait should return once fired");
    }

    #[tokio::test]
    async fn test_wait_observes_later_trigger() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[test]
    fn test_listener_wakes_on_trigger() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        let waiter = std::thread::spawn(move || listener.wait_blocking());
        shutdown.trigger();
        waiter.join().unwrap();
    }

    #[test]
    fn test_listener_after_trigger_returns() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.listener().wait_blocking();
    }

    #[test]
    fn test_listener_wakes_when_all_handles_dropped() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        let waiter = std::thread::spawn(move || listener.wait_blocking());
        drop(shutdown.clone());
        drop(shutdown);
        waiter.join().unwrap();
    }
}
