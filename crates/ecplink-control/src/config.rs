use std::path::Path;
use std::time::Duration;

use ecplink_transport::{Endpoint, TransportConfig, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};

/// Settings for one console instance.
///
/// Deserializes from JSON; missing fields take their defaults:
///
/// ```json
/// { "host": "10.0.0.20", "port": 2008, "reconnect_delay_ms": 5000 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Console IP address or hostname.
    pub host: String,
    pub port: u16,
    /// Fixed delay between reconnect attempts.
    pub reconnect_delay_ms: u64,
    /// Upper bound on one connect attempt. Unset leaves it to the OS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            reconnect_delay_ms: transport.reconnect_delay.as_millis() as u64,
            connect_timeout_ms: None,
        }
    }
}

impl ConsoleConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file without validating it.
    ///
    /// Callers may still override fields before the config reaches
    /// [`Console::init`](crate::Console::init), which validates.
    pub fn read_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ControlError::InvalidConfig("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ControlError::InvalidConfig("port must not be 0".into()));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ControlError::InvalidConfig(
                "reconnect_delay_ms must be positive".into(),
            ));
        }
        if self.connect_timeout_ms == Some(0) {
            return Err(ControlError::InvalidConfig(
                "connect_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.trim(), self.port)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            ..TransportConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ConsoleConfig::from_json_str(r#"{"host": "10.0.0.20"}"#).unwrap();
        assert_eq!(config.port, 2008);
        assert_eq!(config.reconnect_delay_ms, 5000);
        assert_eq!(config.endpoint(), Endpoint::new("10.0.0.20", 2008));
        assert_eq!(
            config.transport_config().reconnect_delay,
            Duration::from_secs(5)
        );
    }

    #[test]
    fn rejects_missing_host_and_zero_port() {
        assert!(matches!(
            ConsoleConfig::from_json_str("{}"),
            Err(ControlError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConsoleConfig::from_json_str(r#"{"host": "a", "port": 0}"#),
            Err(ControlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(matches!(
            ConsoleConfig::from_json_str(r#"{"host": "a", "hots": "b"}"#),
            Err(ControlError::Json(_))
        ));
    }

    #[test]
    fn connect_timeout_carries_into_transport() {
        let mut config = ConsoleConfig::new("console.local", 4000);
        config.connect_timeout_ms = Some(1500);
        let transport = config.transport_config();
        assert_eq!(transport.connect_timeout, Some(Duration::from_millis(1500)));
        assert!(transport.nodelay);
        assert!(transport.keepalive);
    }

    #[test]
    fn read_json_file_skips_validation() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("ecplink-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"port": 3000}"#).unwrap();

        let config = ConsoleConfig::read_json_file(&path).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.host.is_empty());
        assert!(config.validate().is_err());

        std::fs::write(&path, r#"{"port": "x"}"#).unwrap();
        assert!(matches!(
            ConsoleConfig::read_json_file(&path),
            Err(ControlError::Json(_))
        ));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            ConsoleConfig::read_json_file(&path),
            Err(ControlError::Io(_))
        ));
    }
}
