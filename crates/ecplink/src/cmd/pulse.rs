use ecplink_control::{Action, PulseDuration};

use crate::cmd::{finish, open_console, ConsoleArgs, PulseArgs, RELEASE_MARGIN};
use crate::exit::{control_error, CliResult, SUCCESS};
use crate::output::{print_logic, LogicEvent, OutputFormat};

pub async fn run(
    args: PulseArgs,
    console_args: &ConsoleArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let duration = PulseDuration::from_millis(args.duration)
        .map_err(|err| control_error("invalid --duration", err))?;

    let console = open_console(console_args).await?;
    let action = Action::PulseLogic {
        logic_id: args.logic_id,
        duration,
    };
    let sent = console
        .run_action(&action)
        .map_err(|err| control_error("pulse failed", err));
    if sent.is_ok() {
        // The release is a scheduled task; keep the runtime alive until it has run.
        tokio::time::sleep(duration.as_duration() + RELEASE_MARGIN).await;
    }
    let flushed = finish(&console).await;
    sent?;
    flushed?;

    print_logic(
        console.control().transport().endpoint(),
        args.logic_id,
        Some(false),
        LogicEvent::Pulsed {
            duration_ms: duration.as_millis(),
        },
        format,
    );
    Ok(SUCCESS)
}
