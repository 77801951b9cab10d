//! Logic control for DHD ECP consoles.
//!
//! [`LogicControl`] is the imperative API (set, request, pulse, toggle, get)
//! over one [`Transport`](ecplink_transport::Transport). [`Console`] wraps it
//! into a host instance with configuration, actions, feedbacks and variables.

pub mod action;
pub mod config;
pub mod console;
pub mod error;
pub mod facade;
pub mod feedback;
pub mod variables;

pub use action::{Action, PulseDuration, DEFAULT_PULSE_MS, MAX_PULSE_MS, MIN_PULSE_MS};
pub use config::ConsoleConfig;
pub use console::Console;
pub use error::{ControlError, Result};
pub use facade::{LogicControl, DEFAULT_PULSE};
pub use feedback::{FeedbackStyle, LogicStateFeedback, Rgb};
pub use variables::{initial_values, VariableDefinition, HOST_VARIABLE, PORT_VARIABLE, VARIABLES};
