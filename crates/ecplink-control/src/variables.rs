use ecplink_transport::{ConnectionStatus, CONNECTION_STATUS_VARIABLE};

use crate::config::ConsoleConfig;

pub const HOST_VARIABLE: &str = "host";
pub const PORT_VARIABLE: &str = "port";

/// A variable exported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDefinition {
    pub id: &'static str,
    pub name: &'static str,
}

pub const VARIABLES: [VariableDefinition; 3] = [
    VariableDefinition {
        id: CONNECTION_STATUS_VARIABLE,
        name: "Connection Status",
    },
    VariableDefinition {
        id: HOST_VARIABLE,
        name: "DHD Host IP",
    },
    VariableDefinition {
        id: PORT_VARIABLE,
        name: "DHD Port",
    },
];

/// Values published when an instance starts, before the first connect completes.
pub fn initial_values(config: &ConsoleConfig) -> Vec<(&'static str, String)> {
    let mut values = vec![(
        CONNECTION_STATUS_VARIABLE,
        ConnectionStatus::Connecting.variable_text(),
    )];
    values.extend(endpoint_values(config));
    values
}

/// `host` and `port` values for a configuration.
pub fn endpoint_values(config: &ConsoleConfig) -> [(&'static str, String); 2] {
    [
        (HOST_VARIABLE, config.host.clone()),
        (PORT_VARIABLE, config.port.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_values_start_connecting() {
        let config = ConsoleConfig {
            host: "10.0.0.20".into(),
            ..ConsoleConfig::default()
        };
        assert_eq!(
            initial_values(&config),
            vec![
                ("connection_status", "Connecting...".to_string()),
                ("host", "10.0.0.20".to_string()),
                ("port", "2008".to_string()),
            ]
        );
    }

    #[test]
    fn every_initial_value_is_defined() {
        let values = initial_values(&ConsoleConfig::default());
        for (id, _) in values {
            assert!(VARIABLES.iter().any(|v| v.id == id), "{id} undefined");
        }
    }
}
