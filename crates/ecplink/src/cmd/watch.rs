use ecplink_control::LogicControl;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cmd::{open_console, ConsoleArgs, WatchArgs};
use crate::exit::{CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_logic, LogicEvent, OutputFormat};

pub async fn run(
    args: WatchArgs,
    console_args: &ConsoleArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let console = open_console(console_args).await?;
    let result = watch(console.control(), &args, format).await;
    if args.summary && result.is_ok() {
        print_known(console.control(), format);
    }
    console.destroy();
    result
}

fn print_known(control: &LogicControl, format: OutputFormat) {
    let endpoint = control.transport().endpoint();
    for (logic_id, state) in control.store().snapshot() {
        print_logic(endpoint, logic_id, Some(state), LogicEvent::Cached, format);
    }
}

async fn watch(control: &LogicControl, args: &WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let transport = control.transport();
    let mut reports = transport.subscribe_reports();
    let mut status = transport.subscribe_status();
    status.mark_unchanged();

    request_watched(control, args);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                return Ok(SUCCESS);
            }
            changed = status.changed() => {
                if changed.is_err() {
                    return Err(CliError::new(TRANSPORT_ERROR, "transport shut down"));
                }
                let current = status.borrow_and_update().clone();
                info!(status = %current, "connection status changed");
                // Reports may have been missed while the link was down.
                if current.is_connected() {
                    request_watched(control, args);
                }
            }
            report = reports.recv() => match report {
                Ok(report) => {
                    if let Some(logic) = &args.logic {
                        if !logic.contains(&report.logic_id) {
                            continue;
                        }
                    }

                    print_logic(
                        transport.endpoint(),
                        report.logic_id,
                        Some(report.state),
                        LogicEvent::Reported,
                        format,
                    );
                    printed = printed.saturating_add(1);

                    if let Some(count) = args.count {
                        if printed >= count {
                            return Ok(SUCCESS);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped reports"),
                Err(RecvError::Closed) => {
                    return Err(CliError::new(TRANSPORT_ERROR, "transport shut down"));
                }
            },
        }
    }
}

fn request_watched(control: &LogicControl, args: &WatchArgs) {
    for logic_id in args.logic.iter().flatten() {
        if let Err(err) = control.request_logic_state(*logic_id) {
            warn!(logic_id, error = %err, "state request not sent");
        }
    }
}
