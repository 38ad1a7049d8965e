use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Connection settings for the controller's Robot Web Services API.
///
/// ```rust,ignore
/// let config = RwsClientConfig {
///     host: "192.168.125.1".to_string(),
///     ..Default::default()
/// };
///
/// if let Err(e) = config.validate() {
///     println!("Configuration error: {}", e);
///     return;
/// }
///
/// println!("Polling {}", config.base_url());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RwsClientConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub mechunit: String,
    pub tool: String,
    pub wobj: String,
    pub coordinate: String,
    pub gripper_signal: String,
    pub speed_signal: String,
}

impl RwsClientConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::Empty("host"));
        }
        if self.port == 0 {
            return Err(ConfigError::Zero("port"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero("timeout"));
        }
        if self.mechunit.is_empty() {
            return Err(ConfigError::Empty("mechunit"));
        }
        if self.gripper_signal.is_empty() {
            return Err(ConfigError::Empty("gripper signal"));
        }
        if self.speed_signal.is_empty() {
            return Err(ConfigError::Empty("speed signal"));
        }
        Ok(())
    }

    /// Base URL every endpoint path is appended to.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for RwsClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            username: "Default User".to_string(),
            password: "robotics".to_string(),
            timeout: Duration::from_secs(5),
            mechunit: "ROB_1".to_string(),
            tool: "tool0".to_string(),
            wobj: "wobj0".to_string(),
            coordinate: "Base".to_string(),
            gripper_signal: "DI_Gripper1_Closed".to_string(),
            speed_signal: "AO_TCP_SPEED".to_string(),
        }
    }
}

/// Everything the poller needs: where to poll, how often, and where to store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub client: RwsClientConfig,
    pub poll_interval: Duration,
    pub history_capacity: usize,
    pub db_path: PathBuf,
    /// Number of persisted rows shown as "latest measurements".
    pub latest_rows: usize,
}

impl MonitorConfig {
    pub const DEFAULT_DB_PATH: &'static str = "./data/rws_monitor.db";

    /// Defaults overridden by `RWS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MonitorConfig::from_env`] but reading from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let client = &mut config.client;

        if let Some(host) = lookup("RWS_HOST") {
            client.host = host;
        }
        if let Some(port) = lookup("RWS_PORT") {
            client.port = parse_var("RWS_PORT", &port)?;
        }
        if let Some(username) = lookup("RWS_USERNAME") {
            client.username = username;
        }
        if let Some(password) = lookup("RWS_PASSWORD") {
            client.password = password;
        }
        if let Some(timeout) = lookup("RWS_TIMEOUT_MS") {
            client.timeout = Duration::from_millis(parse_var("RWS_TIMEOUT_MS", &timeout)?);
        }
        if let Some(mechunit) = lookup("RWS_MECHUNIT") {
            client.mechunit = mechunit;
        }
        if let Some(signal) = lookup("RWS_GRIPPER_SIGNAL") {
            client.gripper_signal = signal;
        }
        if let Some(signal) = lookup("RWS_SPEED_SIGNAL") {
            client.speed_signal = signal;
        }
        if let Some(interval) = lookup("RWS_POLL_INTERVAL_MS") {
            config.poll_interval =
                Duration::from_millis(parse_var("RWS_POLL_INTERVAL_MS", &interval)?);
        }
        if let Some(path) = lookup("RWS_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client.validate()?;
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero("poll interval"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Zero("history capacity"));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty("database path"));
        }
        if self.latest_rows == 0 {
            return Err(ConfigError::Zero("latest rows"));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            client: RwsClientConfig::default(),
            poll_interval: Duration::from_secs(1),
            history_capacity: crate::history::DEFAULT_CAPACITY,
            db_path: PathBuf::from(Self::DEFAULT_DB_PATH),
            latest_rows: 5,
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client.base_url(), "http://127.0.0.1:8081");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.client.timeout, Duration::from_secs(5));
        assert_eq!(config.history_capacity, 40);
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RWS_HOST", "192.168.125.1"),
            ("RWS_PORT", "80"),
            ("RWS_POLL_INTERVAL_MS", "250"),
            ("RWS_DB_PATH", "/tmp/rws.db"),
        ]
        .into_iter()
        .collect();

        let config = MonitorConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.client.base_url(), "http://192.168.125.1:80");
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.db_path, PathBuf::from("/tmp/rws.db"));
        assert_eq!(config.client.username, "Default User");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = MonitorConfig::from_lookup(|k| (k == "RWS_PORT").then(|| "eighty".to_string()));
        assert_eq!(
            result,
            Err(ConfigError::InvalidVar {
                var: "RWS_PORT",
                value: "eighty".to_string()
            })
        );

        let result = MonitorConfig::from_lookup(|k| (k == "RWS_PORT").then(|| "0".to_string()));
        assert_eq!(result, Err(ConfigError::Zero("port")));
    }
}
