use std::time::Duration;

use ecplink_frame::LogicCommand;
use ecplink_transport::{ConnectionStatus, HostLogLevel, LogicStore, Transport};
use tracing::{debug, info};

use crate::error::Result;

/// Pulse length used when the caller does not pick one.
pub const DEFAULT_PULSE: Duration = Duration::from_millis(100);

/// The imperative logic API: set, request, pulse and toggle.
///
/// Writes go through the [`Transport`]; reads come from the [`LogicStore`] the
/// transport fills. Every call returns immediately. A command issued while
/// disconnected is dropped and reported as
/// [`TransportError::WriteDropped`](ecplink_transport::TransportError::WriteDropped);
/// the drop has already been logged, so callers may ignore it.
#[derive(Debug, Clone)]
pub struct LogicControl {
    transport: Transport,
    store: LogicStore,
}

impl LogicControl {
    pub fn new(transport: Transport) -> Self {
        let store = transport.store().clone();
        Self { transport, store }
    }

    pub fn connect(&self) {
        self.transport.connect();
    }

    /// Close the connection and cancel pending pulse releases.
    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    /// Drive a logic ON or OFF.
    pub fn set_logic_state(&self, logic_id: u16, state: bool) -> Result<()> {
        self.send(LogicCommand::Set { logic_id, state })?;
        info!(logic_id, state = on_off(state), "set logic");
        self.transport.hooks().log(
            HostLogLevel::Info,
            &format!("Set Logic {logic_id} to {}", on_off(state)),
        );
        Ok(())
    }

    /// Ask the console to report a logic's state.
    ///
    /// The reply is decoded asynchronously into the store; poll
    /// [`get_logic_state`](Self::get_logic_state) or subscribe to reports.
    pub fn request_logic_state(&self, logic_id: u16) -> Result<()> {
        self.send(LogicCommand::Request { logic_id })?;
        debug!(logic_id, "requested logic state");
        self.transport.hooks().log(
            HostLogLevel::Debug,
            &format!("Requested Logic {logic_id} state"),
        );
        Ok(())
    }

    /// Set a logic ON, then OFF again after `duration`.
    ///
    /// Produces the rising edge needed by interlock logic inputs. The release
    /// is scheduled even if the ON command was dropped, and is cancelled by
    /// [`disconnect`](Self::disconnect).
    pub fn pulse_logic(&self, logic_id: u16, duration: Duration) -> Result<()> {
        let pressed = self.set_logic_state(logic_id, true);

        let control = self.clone();
        self.transport.schedule(duration, move || {
            if let Err(err) = control.set_logic_state(logic_id, false) {
                debug!(logic_id, error = %err, "pulse release dropped");
            }
        });

        info!(logic_id, ?duration, "pulsed logic");
        self.transport.hooks().log(
            HostLogLevel::Info,
            &format!("Pulsed Logic {logic_id} ({}ms)", duration.as_millis()),
        );
        pressed
    }

    /// Invert the cached state and send it. Returns the state sent.
    ///
    /// A logic that was never reported counts as OFF, so the first toggle
    /// always switches it ON. No round trip to the console happens first.
    pub fn toggle_logic_state(&self, logic_id: u16) -> Result<bool> {
        let next = !self.store.get(logic_id).unwrap_or(false);
        self.set_logic_state(logic_id, next)?;
        Ok(next)
    }

    /// Last reported state, or `None` if unknown.
    pub fn get_logic_state(&self, logic_id: u16) -> Option<bool> {
        self.store.get(logic_id)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.transport.status()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn store(&self) -> &LogicStore {
        &self.store
    }

    fn send(&self, command: LogicCommand) -> Result<()> {
        self.transport.send_block(command.to_block()?)?;
        Ok(())
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}
