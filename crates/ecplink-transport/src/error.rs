use crate::endpoint::Endpoint;

/// Errors that can occur in ECP transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the console.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: Endpoint,
        source: std::io::Error,
    },

    /// Connecting did not finish within the configured timeout.
    #[error("connection to {0} timed out")]
    ConnectTimeout(Endpoint),

    /// An I/O error occurred on an established connection.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Block-level error.
    #[error("frame error: {0}")]
    Frame(#[from] ecplink_frame::FrameError),

    /// The command was dropped because no writable connection is open.
    #[error("command dropped: not connected")]
    WriteDropped,

    /// The transport was disconnected while waiting.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
