use tracing::debug;

use crate::cmd::{finish, open_console, parse_duration, request_state, ConsoleArgs, ToggleArgs};
use crate::exit::{control_error, CliResult, SUCCESS};
use crate::output::{print_logic, LogicEvent, OutputFormat};

pub async fn run(
    args: ToggleArgs,
    console_args: &ConsoleArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let wait_timeout = parse_duration(&args.timeout)?;
    let console = open_console(console_args).await?;
    let control = console.control();

    if args.wait {
        match request_state(control, args.logic_id, wait_timeout).await {
            Ok(current) => debug!(logic_id = args.logic_id, current, "state before toggle"),
            Err(err) => {
                console.destroy();
                return Err(err);
            }
        }
    }

    let toggled = control
        .toggle_logic_state(args.logic_id)
        .map_err(|err| control_error("toggle failed", err));
    let flushed = finish(&console).await;
    let state = toggled?;
    flushed?;

    print_logic(
        control.transport().endpoint(),
        args.logic_id,
        Some(state),
        LogicEvent::Toggled,
        format,
    );
    Ok(SUCCESS)
}
