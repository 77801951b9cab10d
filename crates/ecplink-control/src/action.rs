use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ControlError, Result};
use crate::facade::LogicControl;

/// Shortest pulse an action may request.
pub const MIN_PULSE_MS: u64 = 50;
/// Longest pulse an action may request.
pub const MAX_PULSE_MS: u64 = 1000;
/// Pulse length when an action leaves it out.
pub const DEFAULT_PULSE_MS: u64 = 100;

/// A validated pulse length between [`MIN_PULSE_MS`] and [`MAX_PULSE_MS`].
///
/// Serialized as a plain number of milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PulseDuration(u64);

impl PulseDuration {
    pub fn from_millis(ms: u64) -> Result<Self> {
        if !(MIN_PULSE_MS..=MAX_PULSE_MS).contains(&ms) {
            return Err(ControlError::InvalidPulseDuration {
                ms,
                min: MIN_PULSE_MS,
                max: MAX_PULSE_MS,
            });
        }
        Ok(Self(ms))
    }

    pub fn as_millis(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for PulseDuration {
    fn default() -> Self {
        Self(DEFAULT_PULSE_MS)
    }
}

impl TryFrom<u64> for PulseDuration {
    type Error = ControlError;

    fn try_from(ms: u64) -> Result<Self> {
        Self::from_millis(ms)
    }
}

impl From<PulseDuration> for u64 {
    fn from(pulse: PulseDuration) -> Self {
        pulse.0
    }
}

impl From<PulseDuration> for Duration {
    fn from(pulse: PulseDuration) -> Self {
        pulse.as_duration()
    }
}

impl fmt::Display for PulseDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// User-triggered operations on a console.
///
/// Actions deserialize from JSON objects tagged by `action`, e.g.
/// `{"action": "pulse_logic", "logic_id": 12, "duration": 200}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Drive a logic. With `pulse` set and `state` ON, sends a rising edge
    /// instead of holding the state.
    SetLogicState {
        logic_id: u16,
        state: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pulse: Option<PulseDuration>,
    },
    ToggleLogicState {
        logic_id: u16,
    },
    PulseLogic {
        logic_id: u16,
        #[serde(default)]
        duration: PulseDuration,
    },
    RequestLogicState {
        logic_id: u16,
    },
}

impl Action {
    /// Display name shown to users.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetLogicState { .. } => "Set Logic State",
            Action::ToggleLogicState { .. } => "Toggle Logic State",
            Action::PulseLogic { .. } => "Pulse Logic",
            Action::RequestLogicState { .. } => "Request Logic State",
        }
    }

    pub fn logic_id(&self) -> u16 {
        match self {
            Action::SetLogicState { logic_id, .. }
            | Action::ToggleLogicState { logic_id }
            | Action::PulseLogic { logic_id, .. }
            | Action::RequestLogicState { logic_id } => *logic_id,
        }
    }

    /// Run the action against a console.
    pub fn execute(&self, control: &LogicControl) -> Result<()> {
        debug!(action = self.name(), logic_id = self.logic_id(), "executing action");
        match *self {
            Action::SetLogicState {
                logic_id,
                state: true,
                pulse: Some(pulse),
            } => control.pulse_logic(logic_id, pulse.as_duration()),
            Action::SetLogicState {
                logic_id, state, ..
            } => control.set_logic_state(logic_id, state),
            Action::ToggleLogicState { logic_id } => {
                control.toggle_logic_state(logic_id).map(|_| ())
            }
            Action::PulseLogic { logic_id, duration } => {
                control.pulse_logic(logic_id, duration.as_duration())
            }
            Action::RequestLogicState { logic_id } => control.request_logic_state(logic_id),
        }
    }
}
