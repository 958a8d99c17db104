//! Loader configuration.

use std::time::Duration;

/// Default per-statement timeout in seconds.
pub const DEFAULT_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default `application_name` reported to the server.
pub const DEFAULT_APPLICATION_NAME: &str = "pgcompare";

/// Catalog loader configuration.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Upper bound for each catalog query.
    pub statement_timeout: Duration,

    /// Upper bound for establishing a connection.
    pub connect_timeout: Duration,

    /// Application name shown in `pg_stat_activity`.
    pub application_name: String,
}

impl LoadConfig {
    /// Create a configuration with default timeouts.
    pub fn new() -> Self {
        Self {
            statement_timeout: Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }

    /// Set the statement timeout.
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the application name.
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }

    /// Statement timeout as a `SET LOCAL` value. Zero disables the timeout.
    pub(crate) fn statement_timeout_setting(&self) -> String {
        format!("{}ms", self.statement_timeout.as_millis())
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoadConfig::default();
        assert_eq!(
            config.statement_timeout,
            Duration::from_secs(DEFAULT_STATEMENT_TIMEOUT_SECS)
        );
        assert_eq!(config.application_name, "pgcompare");
    }

    #[test]
    fn test_builders() {
        let config = LoadConfig::new()
            .with_statement_timeout(Duration::from_millis(1500))
            .with_connect_timeout(Duration::from_secs(2))
            .with_application_name("audit");
        assert_eq!(config.statement_timeout_setting(), "1500ms");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.application_name, "audit");
    }
}
