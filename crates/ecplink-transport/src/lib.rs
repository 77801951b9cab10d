//! Reconnecting TCP transport for DHD ECP consoles.
//!
//! Owns the socket to one console, reassembles the incoming byte stream into
//! blocks, caches reported logic states and writes outgoing commands.
//! Connection failures never surface as fatal errors: they are reported to the
//! host through [`HostHooks`] and retried on a fixed timer.

pub mod config;
pub mod endpoint;
pub mod error;
pub mod hooks;
pub mod status;
pub mod store;
pub mod transport;

pub use config::{TransportConfig, DEFAULT_RECONNECT_DELAY};
pub use endpoint::{Endpoint, DEFAULT_PORT};
pub use error::{Result, TransportError};
pub use hooks::{
    HostHooks, HostLogLevel, NoopHooks, CONNECTION_STATUS_VARIABLE, LOGIC_STATE_FEEDBACK,
};
pub use status::{ConnectionStatus, InstanceStatus};
pub use store::LogicStore;
pub use transport::Transport;
