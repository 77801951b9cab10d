use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ecplink_transport::Endpoint;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What a command did to, or learned about, one logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicEvent {
    Set,
    Pulsed { duration_ms: u64 },
    Toggled,
    Reported,
    /// Last state held in the local cache.
    Cached,
}

impl LogicEvent {
    fn as_str(self) -> &'static str {
        match self {
            LogicEvent::Set => "set",
            LogicEvent::Pulsed { .. } => "pulse",
            LogicEvent::Toggled => "toggle",
            LogicEvent::Reported => "report",
            LogicEvent::Cached => "cached",
        }
    }
}

#[derive(Serialize)]
struct LogicOutput<'a> {
    console: String,
    event: &'a str,
    logic_id: u16,
    state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pulse_ms: Option<u64>,
    timestamp: String,
}

pub fn print_logic(
    endpoint: &Endpoint,
    logic_id: u16,
    state: Option<bool>,
    event: LogicEvent,
    format: OutputFormat,
) {
    let pulse_ms = match event {
        LogicEvent::Pulsed { duration_ms } => Some(duration_ms),
        _ => None,
    };
    let state = state_label(state);

    match format {
        OutputFormat::Json => {
            let out = LogicOutput {
                console: endpoint.to_string(),
                event: event.as_str(),
                logic_id,
                state,
                pulse_ms,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["LOGIC", "STATE", "EVENT", "CONSOLE"])
                .add_row(vec![
                    logic_id.to_string(),
                    state.to_string(),
                    event_detail(event),
                    endpoint.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "logic={} state={} event={} console={}",
                logic_id,
                state,
                event_detail(event),
                endpoint
            );
        }
    }
}

pub fn state_label(state: Option<bool>) -> &'static str {
    match state {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => "unknown",
    }
}

fn event_detail(event: LogicEvent) -> String {
    match event {
        LogicEvent::Pulsed { duration_ms } => format!("pulse ({duration_ms}ms)"),
        other => other.as_str().to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
