//! Runtime configuration read from the environment.

use std::path::PathBuf;

use readquest_catalog::Mode;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Whether progress-derived locks apply.
    pub mode: Mode,
    /// Catalog YAML to load instead of the embedded one.
    pub catalog_path: Option<PathBuf>,
    /// OTLP collector endpoint; spans are only exported when set.
    pub otlp_endpoint: Option<String>,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or a value
    /// does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Empty values count as
    /// unset.
    ///
    /// # Errors
    ///
    /// As [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_owned())
        })?;
        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("PORT must be a valid u16: {e}")))?,
            None => DEFAULT_PORT,
        };
        let mode = match get("READQUEST_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|e| AppError::Config(format!("READQUEST_MODE: {e}")))?,
            None => Mode::default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            mode,
            catalog_path: get("READQUEST_CATALOG").map(PathBuf::from),
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// `host:port`, ready to parse as a socket address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use readquest_catalog::Mode;

    use super::AppConfig;
    use crate::error::AppError;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/readquest")]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.catalog_path, None);
        assert_eq!(config.otlp_endpoint, None);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_every_variable_is_read() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://db/readquest"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("READQUEST_MODE", "dev"),
            ("READQUEST_CATALOG", "/etc/readquest/catalog.yaml"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.mode, Mode::Development);
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/etc/readquest/catalog.yaml"))
        );
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_missing_database_url_is_a_config_error() {
        let result = config_from(&[("PORT", "8080")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_blank_database_url_counts_as_missing() {
        let result = config_from(&[("DATABASE_URL", "  ")]);

        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let result = config_from(&[("DATABASE_URL", "postgres://db"), ("PORT", "99999")]);

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("PORT")));
    }

    #[test]
    fn test_unknown_mode_is_a_config_error() {
        let result = config_from(&[("DATABASE_URL", "postgres://db"), ("READQUEST_MODE", "staging")]);

        assert!(matches!(result, Err(AppError::Config(message)) if message.contains("READQUEST_MODE")));
    }
}
