use std::sync::Arc;

use ecplink_transport::{HostHooks, HostLogLevel, InstanceStatus, LogicStore, Transport};
use tracing::{debug, info};

use crate::action::Action;
use crate::config::ConsoleConfig;
use crate::error::Result;
use crate::facade::LogicControl;
use crate::feedback::LogicStateFeedback;
use crate::variables;

/// One configured console: owns the transport, store and command facade.
///
/// Must be created and reconfigured from within a Tokio runtime.
pub struct Console {
    config: ConsoleConfig,
    hooks: Arc<dyn HostHooks>,
    control: LogicControl,
}

impl Console {
    /// Validate `config`, publish initial status and variables, then connect.
    pub fn init(config: ConsoleConfig, hooks: Arc<dyn HostHooks>) -> Result<Self> {
        config.validate()?;

        hooks.update_status(InstanceStatus::Connecting, None);
        hooks.set_variable_values(&variables::initial_values(&config));

        let control = build_control(&config, &hooks);
        info!(endpoint = %control.transport().endpoint(), "console instance started");
        control.connect();

        Ok(Self {
            config,
            hooks,
            control,
        })
    }

    /// Tear down the current connection and start over with `config`.
    ///
    /// The old transport is disconnected before the new one exists. Cached
    /// logic states are discarded with it.
    pub fn config_updated(&mut self, config: ConsoleConfig) -> Result<()> {
        config.validate()?;

        self.control.disconnect();
        self.hooks
            .set_variable_values(&variables::endpoint_values(&config));

        let control = build_control(&config, &self.hooks);
        info!(
            from = %self.control.transport().endpoint(),
            to = %control.transport().endpoint(),
            "console reconfigured"
        );
        control.connect();

        self.config = config;
        self.control = control;
        Ok(())
    }

    /// Disconnect and cancel everything pending. Safe to call more than once.
    pub fn destroy(&self) {
        debug!(endpoint = %self.control.transport().endpoint(), "destroy");
        self.hooks.log(HostLogLevel::Debug, "destroy");
        self.control.disconnect();
    }

    pub fn control(&self) -> &LogicControl {
        &self.control
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn run_action(&self, action: &Action) -> Result<()> {
        action.execute(&self.control)
    }

    pub fn check_feedback(&self, feedback: &LogicStateFeedback) -> bool {
        feedback.evaluate(self.control.store())
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("config", &self.config)
            .field("control", &self.control)
            .finish()
    }
}

fn build_control(config: &ConsoleConfig, hooks: &Arc<dyn HostHooks>) -> LogicControl {
    let transport = Transport::with_config(
        config.endpoint(),
        LogicStore::new(),
        Arc::clone(hooks),
        config.transport_config(),
    );
    LogicControl::new(transport)
}
