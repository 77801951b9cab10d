/// Errors that can occur in control operations.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Transport-level error, including dropped writes.
    #[error("transport error: {0}")]
    Transport(#[from] ecplink_transport::TransportError),

    /// Block-level error.
    #[error("frame error: {0}")]
    Frame(#[from] ecplink_frame::FrameError),

    /// Pulse duration outside the range accepted by actions.
    #[error("pulse duration {ms} ms out of range ({min}-{max} ms)")]
    InvalidPulseDuration { ms: u64, min: u64, max: u64 },

    /// Configuration is incomplete or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ControlError {
    /// Whether the command was dropped because nothing was connected.
    pub fn is_write_dropped(&self) -> bool {
        matches!(
            self,
            ControlError::Transport(ecplink_transport::TransportError::WriteDropped)
        )
    }
}

pub type Result<T> = std::result::Result<T, ControlError>;
