use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use ecplink_control::{Console, ConsoleConfig, LogicControl};
use ecplink_transport::{ConnectionStatus, NoopHooks};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::exit::{
    control_error, transport_error, CliError, CliResult, TIMEOUT, TRANSPORT_ERROR, USAGE,
};
use crate::output::OutputFormat;

pub mod get;
pub mod pulse;
pub mod set;
pub mod toggle;
pub mod version;
pub mod watch;

/// Connect timeout when neither the flag nor the config file sets one.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Slack after a pulse before the release is assumed to be queued.
const RELEASE_MARGIN: Duration = Duration::from_millis(20);

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Drive a logic ON or OFF.
    Set(SetArgs),
    /// Send a rising edge: ON, then OFF after a delay.
    Pulse(PulseArgs),
    /// Invert a logic's state.
    Toggle(ToggleArgs),
    /// Request and print a logic's current state.
    Get(GetArgs),
    /// Print logic reports as the console sends them.
    Watch(WatchArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(
    command: Command,
    console: &ConsoleArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    match command {
        Command::Set(args) => set::run(args, console, format).await,
        Command::Pulse(args) => pulse::run(args, console, format).await,
        Command::Toggle(args) => toggle::run(args, console, format).await,
        Command::Get(args) => get::run(args, console, format).await,
        Command::Watch(args) => watch::run(args, console, format).await,
        Command::Version(args) => version::run(args),
    }
}

/// Where the console lives and how long to try reaching it.
#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Console IP address or hostname.
    #[arg(long, env = "ECPLINK_HOST", global = true)]
    pub host: Option<String>,
    /// ECP port [default: 2008].
    #[arg(long, env = "ECPLINK_PORT", global = true)]
    pub port: Option<u16>,
    /// JSON console configuration; --host and --port override its values.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
    /// Time allowed to reach the console (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", global = true)]
    pub connect_timeout: Option<String>,
}

impl ConsoleArgs {
    /// Merge the config file with flags. Validation happens when the console starts.
    pub fn resolve(&self) -> CliResult<(ConsoleConfig, Duration)> {
        let mut config = match &self.config {
            Some(path) => ConsoleConfig::read_json_file(path).map_err(|err| {
                control_error(&format!("failed loading {}", path.display()), err)
            })?,
            None => ConsoleConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if config.host.trim().is_empty() {
            return Err(CliError::new(
                USAGE,
                "no console host given (use --host, ECPLINK_HOST or --config)",
            ));
        }

        let connect_timeout = match &self.connect_timeout {
            Some(raw) => parse_duration(raw)?,
            None => config
                .connect_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
        };
        config.connect_timeout_ms = Some(connect_timeout.as_millis() as u64);

        Ok((config, connect_timeout))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    On,
    Off,
}

impl StateArg {
    pub fn is_on(self) -> bool {
        matches!(self, StateArg::On)
    }
}

#[derive(Args, Debug)]
pub struct SetArgs {
    /// Logic address (0-65535).
    pub logic_id: u16,
    /// Target state.
    pub state: StateArg,
    /// Send a rising edge instead of holding the state (ON only).
    #[arg(long)]
    pub pulse: bool,
    /// Pulse length in milliseconds (50-1000).
    #[arg(long, value_name = "MS", default_value_t = ecplink_control::DEFAULT_PULSE_MS)]
    pub pulse_duration: u64,
}

#[derive(Args, Debug)]
pub struct PulseArgs {
    /// Logic address (0-65535).
    pub logic_id: u16,
    /// Pulse length in milliseconds (50-1000).
    #[arg(long, value_name = "MS", default_value_t = ecplink_control::DEFAULT_PULSE_MS)]
    pub duration: u64,
}

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Logic address (0-65535).
    pub logic_id: u16,
    /// Ask the console for the current state first instead of assuming OFF.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the state report when --wait is set.
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Logic address (0-65535).
    pub logic_id: u16,
    /// Maximum time to wait for the state report (e.g. 2s, 500ms).
    #[arg(long, default_value = "2s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Only print these logics (comma-separated). Their state is requested on connect.
    #[arg(long, value_delimiter = ',')]
    pub logic: Option<Vec<u16>>,
    /// Exit after printing N reports.
    #[arg(long)]
    pub count: Option<usize>,
    /// On exit, print the last known state of every reported logic.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Start a console instance and wait until it is connected.
pub async fn open_console(args: &ConsoleArgs) -> CliResult<Console> {
    let (config, connect_timeout) = args.resolve()?;
    let console = Console::init(config, Arc::new(NoopHooks))
        .map_err(|err| control_error("invalid console configuration", err))?;

    if let Err(err) = wait_connected(console.control(), connect_timeout).await {
        console.destroy();
        return Err(err);
    }
    Ok(console)
}

async fn wait_connected(control: &LogicControl, limit: Duration) -> CliResult<()> {
    let transport = control.transport();
    match tokio::time::timeout(limit, transport.connected()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(transport_error("connect failed", err)),
        Err(_) => match transport.status() {
            ConnectionStatus::Failed(reason) => Err(CliError::new(
                TRANSPORT_ERROR,
                format!("cannot reach {}: {reason}", transport.endpoint()),
            )),
            _ => Err(CliError::new(
                TIMEOUT,
                format!(
                    "timed out connecting to {} after {limit:?}",
                    transport.endpoint()
                ),
            )),
        },
    }
}

/// Request a logic's state and wait for the matching report.
pub async fn request_state(
    control: &LogicControl,
    logic_id: u16,
    limit: Duration,
) -> CliResult<bool> {
    let mut reports = control.transport().subscribe_reports();
    control
        .request_logic_state(logic_id)
        .map_err(|err| control_error("request failed", err))?;

    let report = async {
        loop {
            match reports.recv().await {
                Ok(report) if report.logic_id == logic_id => return Ok(report.state),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "report subscriber lagged");
                    if let Some(state) = control.get_logic_state(logic_id) {
                        return Ok(state);
                    }
                }
                Err(RecvError::Closed) => {
                    return Err(CliError::new(TRANSPORT_ERROR, "connection closed"));
                }
            }
        }
    };

    tokio::time::timeout(limit, report).await.map_err(|_| {
        CliError::new(
            TIMEOUT,
            format!("no report for logic {logic_id} within {limit:?}"),
        )
    })?
}

/// Wait for queued blocks to reach the socket, then shut the console down.
pub async fn finish(console: &Console) -> CliResult<()> {
    let flushed = console.control().transport().flush().await;
    console.destroy();
    flushed.map_err(|err| transport_error("flush failed", err))
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
