use crate::cmd::{open_console, parse_duration, request_state, ConsoleArgs, GetArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_logic, LogicEvent, OutputFormat};

pub async fn run(
    args: GetArgs,
    console_args: &ConsoleArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let console = open_console(console_args).await?;

    let state = request_state(console.control(), args.logic_id, timeout).await;
    console.destroy();
    let state = state?;

    print_logic(
        console.control().transport().endpoint(),
        args.logic_id,
        Some(state),
        LogicEvent::Reported,
        format,
    );
    Ok(SUCCESS)
}
