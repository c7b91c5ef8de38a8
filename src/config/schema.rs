//! Configuration schema definitions.
//!
//! All types derive Serde traits so a config file can be deserialized
//! directly; the environment is layered on top afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// Deployment environment selected by the `ENV` variable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    /// Developer machine: human readable output on stderr.
    #[default]
    Local,
    /// Test runs: JSON on stdout without timestamps.
    Test,
    /// Anything else. The name is kept for the `env` field.
    Production(String),
}

impl Environment {
    /// Parse an environment name. An empty name means `local`.
    pub fn parse(name: &str) -> Self {
        match name {
            "" | "local" => Environment::Local,
            "test" => Environment::Test,
            other => Environment::Production(other.to_string()),
        }
    }

    /// The name attached to every entry as the `env` field.
    pub fn name(&self) -> &str {
        match self {
            Environment::Local => "local",
            Environment::Test => "test",
            Environment::Production(name) => name,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Environment {
    fn from(name: String) -> Self {
        Environment::parse(&name)
    }
}

impl From<Environment> for String {
    fn from(env: Environment) -> Self {
        env.name().to_string()
    }
}

/// Root configuration for the logger factory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Deployment environment (`ENV`).
    pub env: Environment,

    /// Force the debug threshold outside of local and test (`DEBUG`).
    pub debug: bool,

    /// Explicit version string (`VERSION`).
    pub version: Option<String>,
}

impl LogConfig {
    /// Resolve the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Resolve the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Apply `ENV`, `DEBUG` and `VERSION` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a lookup. Empty values are treated as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(env) = lookup("ENV") {
            self.env = Environment::parse(&env);
        }
        if lookup("DEBUG").is_some() {
            self.debug = true;
        }
        if let Some(version) = lookup("VERSION") {
            self.version = Some(version);
        }
        self
    }

    /// Severity threshold for this configuration.
    pub fn level(&self) -> LevelFilter {
        match self.env {
            Environment::Local | Environment::Test => LevelFilter::DEBUG,
            Environment::Production(_) if self.debug => LevelFilter::DEBUG,
            Environment::Production(_) => LevelFilter::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse(""), Environment::Local);
        assert_eq!(Environment::parse("local"), Environment::Local);
        assert_eq!(Environment::parse("test"), Environment::Test);
        assert_eq!(
            Environment::parse("staging"),
            Environment::Production("staging".into())
        );
        assert_eq!(Environment::parse("staging").name(), "staging");
    }

    #[test]
    fn test_unset_environment_is_local() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config.env, Environment::Local);
        assert!(!config.debug);
        assert_eq!(config.version, None);
        assert_eq!(config.level(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_production_threshold() {
        let config = LogConfig::from_lookup(lookup(&[("ENV", "production")]));
        assert_eq!(config.level(), LevelFilter::INFO);

        let config = LogConfig::from_lookup(lookup(&[("ENV", "production"), ("DEBUG", "1")]));
        assert!(config.debug);
        assert_eq!(config.level(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = LogConfig::from_lookup(lookup(&[("ENV", "prod"), ("DEBUG", ""), ("VERSION", "")]));
        assert!(!config.debug);
        assert_eq!(config.version, None);
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let file = LogConfig {
            env: Environment::Test,
            debug: false,
            version: Some("from-file".into()),
        };
        let config = file.with_overrides(lookup(&[("VERSION", "v1.2.3")]));
        assert_eq!(config.env, Environment::Test);
        assert_eq!(config.version.as_deref(), Some("v1.2.3"));
    }
}
