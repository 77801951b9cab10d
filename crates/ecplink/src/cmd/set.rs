use ecplink_control::{Action, PulseDuration};

use crate::cmd::{finish, open_console, ConsoleArgs, SetArgs, RELEASE_MARGIN};
use crate::exit::{control_error, CliResult, SUCCESS};
use crate::output::{print_logic, LogicEvent, OutputFormat};

pub async fn run(
    args: SetArgs,
    console_args: &ConsoleArgs,
    format: OutputFormat,
) -> CliResult<i32> {
    let state = args.state.is_on();
    let pulse = if args.pulse && state {
        Some(
            PulseDuration::from_millis(args.pulse_duration)
                .map_err(|err| control_error("invalid --pulse-duration", err))?,
        )
    } else {
        None
    };

    let console = open_console(console_args).await?;
    let action = Action::SetLogicState {
        logic_id: args.logic_id,
        state,
        pulse,
    };
    let sent = console
        .run_action(&action)
        .map_err(|err| control_error("set failed", err));
    if let (Ok(()), Some(pulse)) = (&sent, pulse) {
        tokio::time::sleep(pulse.as_duration() + RELEASE_MARGIN).await;
    }
    let flushed = finish(&console).await;
    sent?;
    flushed?;

    let (final_state, event) = match pulse {
        Some(pulse) => (
            false,
            LogicEvent::Pulsed {
                duration_ms: pulse.as_millis(),
            },
        ),
        None => (state, LogicEvent::Set),
    };
    print_logic(
        console.control().transport().endpoint(),
        args.logic_id,
        Some(final_state),
        event,
        format,
    );
    Ok(SUCCESS)
}
