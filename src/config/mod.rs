// Configuration module entry point
// Loads server, HTTP and logging settings from an optional file plus environment

mod types;

use crate::error::{Error, Result};
use std::net::SocketAddr;

pub use types::{Config, Credentials, HttpConfig, LoggingConfig, ServerConfig};

/// Prefix for environment overrides, e.g. `ERRHTTP_SERVER__PORT=9000`
pub const ENV_PREFIX: &str = "ERRHTTP";

impl Config {
    /// Load configuration from the given file path (extension optional).
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|e| Error::InvalidAddress(format!("{addr}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::AccessLogFormat;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.max_body_size, 10_485_760);
        assert!(cfg.server.keep_alive);
        assert!(!cfg.http.enable_cors);
        assert!(cfg.http.basic_auth.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(
            cfg.socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let cfg = Config::load_from("/nonexistent/errhttp-test-config").unwrap();
        assert_eq!(cfg.server, ServerConfig::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("errhttp-config-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9090
max_body_size = 2048

[http]
enable_cors = true

[http.basic_auth]
username = "admin"
password = "secret"

[logging]
level = "debug"
access_log_format = "common"
"#
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.max_body_size, 2048);
        assert!(cfg.http.enable_cors);
        let creds = cfg.http.basic_auth.unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password, "secret");
        assert_eq!(cfg.logging.level, "debug");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, AccessLogFormat::Common);
    }

    #[test]
    fn test_invalid_host_is_reported() {
        let mut cfg = Config::default();
        cfg.server.host = "not a host".to_string();
        assert!(matches!(cfg.socket_addr(), Err(Error::InvalidAddress(_))));
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let creds = Credentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
