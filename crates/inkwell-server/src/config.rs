//! Server configuration for Inkwell.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `INKWELL_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Default port, bound on localhost.
const DEFAULT_PORT: u16 = 4567;

/// Default idle session lifetime: one day.
const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;

/// Which directory tree the server reads documents and credentials from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `<root>/data` and `<root>/users.yml`.
    Production,
    /// `<root>/test/data` and `<root>/test/users.yml`.
    Test,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Production or test directory tree.
    pub mode: Mode,
    /// Base directory both trees live under.
    pub root: PathBuf,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Seconds a session may sit idle before it expires.
    pub session_ttl_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `INKWELL_BIND_ADDR` — full bind address (default: `127.0.0.1:4567`)
    /// - `PORT` — port to bind on `0.0.0.0`, used when `INKWELL_BIND_ADDR` is unset
    /// - `INKWELL_ENV` — `test` selects the test tree (default: `production`)
    /// - `INKWELL_ROOT` — base directory (default: `.`)
    /// - `INKWELL_LOG_LEVEL` — log filter (default: `info`)
    /// - `INKWELL_SESSION_TTL` — idle session lifetime in seconds (default: `86400`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));

        // Priority: INKWELL_BIND_ADDR > PORT > default 127.0.0.1:4567
        let bind_addr = if let Some(addr) = lookup("INKWELL_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let mode = match lookup("INKWELL_ENV").as_deref().map(str::to_lowercase) {
            Some(env) if env == "test" => Mode::Test,
            _ => Mode::Production,
        };

        let root = lookup("INKWELL_ROOT").map_or_else(|| PathBuf::from("."), PathBuf::from);

        let log_level = lookup("INKWELL_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let session_ttl_secs = lookup("INKWELL_SESSION_TTL")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_SECS);

        Self {
            bind_addr,
            mode,
            root,
            log_level,
            session_ttl_secs,
        }
    }

    /// Configuration for a server rooted at `root`, with defaults elsewhere.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            mode,
            root: root.into(),
            ..Self::from_lookup(|_| None)
        }
    }

    /// Root of the active tree.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        match self.mode {
            Mode::Production => self.root.clone(),
            Mode::Test => self.root.join("test"),
        }
    }

    /// Directory holding the documents.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir().join("data")
    }

    /// The credential mapping file, a sibling of the data directory.
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.base_dir().join("users.yml")
    }

    /// Idle session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = i64::try_from(self.session_ttl_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 4567)));
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.data_dir(), PathBuf::from("./data"));
        assert_eq!(config.credentials_path(), PathBuf::from("./users.yml"));
    }

    #[test]
    fn test_mode_uses_test_tree() {
        let config = config_from(&[("INKWELL_ENV", "test"), ("INKWELL_ROOT", "/srv/cms")]);
        assert_eq!(config.mode, Mode::Test);
        assert_eq!(config.data_dir(), PathBuf::from("/srv/cms/test/data"));
        assert_eq!(
            config.credentials_path(),
            PathBuf::from("/srv/cms/test/users.yml")
        );
    }

    #[test]
    fn bind_addr_beats_port() {
        let config = config_from(&[("INKWELL_BIND_ADDR", "127.0.0.1:9000"), ("PORT", "8080")]);
        assert_eq!(config.bind_addr.port(), 9000);

        let config = config_from(&[("PORT", "8080")]);
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[
            ("INKWELL_BIND_ADDR", "nonsense"),
            ("INKWELL_SESSION_TTL", "-5"),
            ("INKWELL_ENV", "staging"),
        ]);
        assert_eq!(config.bind_addr.port(), 4567);
        assert_eq!(config.session_ttl_secs, 86_400);
        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn session_ttl_converts_to_duration() {
        let config = config_from(&[("INKWELL_SESSION_TTL", "90")]);
        assert_eq!(config.session_ttl(), chrono::Duration::seconds(90));
    }
}
