// Configuration module entry point
// Layered configuration loading and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, LogLevel, LoggingConfig};

/// Environment variable prefix, e.g. `TIME_SYNCER_SERVER__PORT=9000`
const ENV_PREFIX: &str = "TIME_SYNCER";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_layered(config_path, Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
    }

    /// Defaults, then the optional file, then `env` on top
    fn load_layered(
        config_path: &str,
        env: config::Environment,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.shutdown_grace", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.backlog", 128)?
            .set_default("http.endpoint_path", "/")?
            .set_default(
                "http.server_name",
                concat!("time-syncer/", env!("CARGO_PKG_VERSION")),
            )?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if !self.http.endpoint_path.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "http.endpoint_path must start with '/', got '{}'",
                self.http.endpoint_path
            )));
        }
        if self.server.workers == Some(0) {
            return Err(config::ConfigError::Message(
                "server.workers must be at least 1 when set".to_string(),
            ));
        }
        if self.connection_timeout().is_zero() {
            return Err(config::ConfigError::Message(
                "performance.read_timeout and performance.write_timeout cannot both be 0"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }

    /// Overall lifetime budget for one connection
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(std::cmp::max(
            self.performance.read_timeout,
            self.performance.write_timeout,
        ))
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_grace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/time-syncer").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.workers, None);
        assert_eq!(cfg.logging.level, LogLevel::Info);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.performance.max_connections, None);
        assert_eq!(cfg.http.endpoint_path, "/");
        assert!(cfg.http.server_name.starts_with("time-syncer/"));
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("does-not-exist/time-syncer").unwrap();
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );

        cfg.server.host = "not a host".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(ServerError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_endpoint_path_must_be_absolute() {
        let mut cfg = Config::load_from("does-not-exist/time-syncer").unwrap();
        cfg.http.endpoint_path = "time".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut cfg = Config::load_from("does-not-exist/time-syncer").unwrap();
        cfg.server.workers = Some(0);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("server.workers"));

        cfg.server.workers = Some(1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_connection_timeout_rejected() {
        let mut cfg = Config::load_from("does-not-exist/time-syncer").unwrap();
        cfg.performance.read_timeout = 0;
        cfg.performance.write_timeout = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("read_timeout"));

        // One non-zero side is enough
        cfg.performance.write_timeout = 3;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected_at_load() {
        let env = Config::environment().source(Some(env_map(&[(
            "TIME_SYNCER_SERVER__WORKERS",
            "0",
        )])));
        assert!(Config::load_layered("does-not-exist/time-syncer", env).is_err());
    }

    fn env_map(vars: &[(&str, &str)]) -> config::Map<String, String> {
        vars.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = std::env::temp_dir().join(format!("time-syncer-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("time-syncer.toml"),
            include_str!("../../config.example.toml"),
        )
        .unwrap();
        let path = dir.join("time-syncer");

        let env = Config::environment().source(Some(env_map(&[
            ("TIME_SYNCER_SERVER__PORT", "9123"),
            ("TIME_SYNCER_SERVER__WORKERS", "7"),
            ("TIME_SYNCER_LOGGING__ACCESS_LOG", "false"),
        ])));
        let cfg = Config::load_layered(path.to_str().unwrap(), env).unwrap();
        let _ = std::fs::remove_dir_all(&dir);

        // Env wins over the file, the file wins over defaults
        assert_eq!(cfg.server.port, 9123);
        assert_eq!(cfg.server.workers, Some(7));
        assert!(!cfg.logging.access_log);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.http.server_name, "time-syncer");
        assert_eq!(cfg.server.shutdown_grace, 10);
    }

    #[test]
    fn test_connection_timeout_uses_larger_value() {
        let mut cfg = Config::load_from("does-not-exist/time-syncer").unwrap();
        cfg.performance.read_timeout = 5;
        cfg.performance.write_timeout = 12;
        assert_eq!(cfg.connection_timeout(), Duration::from_secs(12));
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
    }
}
