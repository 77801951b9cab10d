use std::fmt;

/// Connection state of one transport.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    /// Coarse status reported to the host.
    pub fn instance_status(&self) -> InstanceStatus {
        match self {
            ConnectionStatus::Disconnected => InstanceStatus::Disconnected,
            ConnectionStatus::Connecting => InstanceStatus::Connecting,
            ConnectionStatus::Connected => InstanceStatus::Ok,
            ConnectionStatus::Failed(_) => InstanceStatus::ConnectionFailure,
        }
    }

    /// Text for the `connection_status` variable.
    pub fn variable_text(&self) -> String {
        match self {
            ConnectionStatus::Disconnected => "Disconnected".to_string(),
            ConnectionStatus::Connecting => "Connecting...".to_string(),
            ConnectionStatus::Connected => "Connected".to_string(),
            ConnectionStatus::Failed(reason) => format!("Error: {reason}"),
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("disconnected"),
            ConnectionStatus::Connecting => f.write_str("connecting"),
            ConnectionStatus::Connected => f.write_str("connected"),
            ConnectionStatus::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Status kinds understood by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceStatus {
    Ok,
    Connecting,
    Disconnected,
    ConnectionFailure,
}

impl InstanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstanceStatus::Ok => "ok",
            InstanceStatus::Connecting => "connecting",
            InstanceStatus::Disconnected => "disconnected",
            InstanceStatus::ConnectionFailure => "connection_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_text_matches_host_wording() {
        assert_eq!(ConnectionStatus::Connected.variable_text(), "Connected");
        assert_eq!(
            ConnectionStatus::Failed("connection refused".into()).variable_text(),
            "Error: connection refused"
        );
        assert_eq!(
            ConnectionStatus::Failed("x".into()).instance_status(),
            InstanceStatus::ConnectionFailure
        );
    }
}
