//! Callbacks into the host application.
//!
//! The transport calls these but never depends on what they do. Every method
//! has a no-op default so hosts implement only what they display.

use std::fmt;

use crate::status::InstanceStatus;

/// Feedback class re-evaluated whenever a logic report arrives.
pub const LOGIC_STATE_FEEDBACK: &str = "logic_state";

/// Variable holding the human-readable connection state.
pub const CONNECTION_STATUS_VARIABLE: &str = "connection_status";

/// Severity of a host log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for HostLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HostLogLevel::Debug => "debug",
            HostLogLevel::Info => "info",
            HostLogLevel::Warn => "warn",
            HostLogLevel::Error => "error",
        })
    }
}

/// Host collaborator interface.
pub trait HostHooks: Send + Sync {
    fn log(&self, _level: HostLogLevel, _message: &str) {}

    fn update_status(&self, _status: InstanceStatus, _detail: Option<&str>) {}

    fn set_variable_values(&self, _values: &[(&str, String)]) {}

    fn notify_feedback_class_changed(&self, _class: &str) {}
}

/// Hooks that ignore every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl HostHooks for NoopHooks {}
