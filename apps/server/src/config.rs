//! Server configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub log_filter: String,
    /// Matching sessions untouched for this long are dropped.
    pub session_idle_timeout: Duration,
}

impl Config {
    /// Read `HOST`, `PORT`, `DATABASE_PATH`, `RUST_LOG` and
    /// `SESSION_IDLE_MINUTES`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
            None => 3000,
        };
        let idle_minutes: u64 = match lookup("SESSION_IDLE_MINUTES") {
            Some(minutes) => minutes.parse().with_context(|| {
                format!("SESSION_IDLE_MINUTES must be a whole number, got {minutes:?}")
            })?,
            None => 60,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "matchdeck.db".to_string())
                .into(),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            session_idle_timeout: Duration::from_secs(idle_minutes.saturating_mul(60)),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
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
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_path, PathBuf::from("matchdeck.db"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_PATH", "/tmp/decks.db"),
            ("SESSION_IDLE_MINUTES", "5"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.database_path, PathBuf::from("/tmp/decks.db"));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_port() {
        assert!(Config::from_lookup(lookup(&[("PORT", "http")])).is_err());
    }

    #[test]
    fn test_invalid_idle_timeout() {
        assert!(Config::from_lookup(lookup(&[("SESSION_IDLE_MINUTES", "soon")])).is_err());
    }
}
