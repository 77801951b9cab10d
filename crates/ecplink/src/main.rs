mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, ConsoleArgs};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "ecplink", version, about = "DHD ECP logic control CLI")]
struct Cli {
    #[command(flatten)]
    console: ConsoleArgs,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, &cli.console, format).await;

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_with_pulse() {
        let cli = Cli::try_parse_from([
            "ecplink",
            "--host",
            "10.0.0.20",
            "set",
            "42",
            "on",
            "--pulse",
            "--pulse-duration",
            "250",
        ])
        .expect("set args should parse");

        assert_eq!(cli.console.host.as_deref(), Some("10.0.0.20"));
        match cli.command {
            Command::Set(args) => {
                assert_eq!(args.logic_id, 42);
                assert!(args.pulse);
                assert_eq!(args.pulse_duration, 250);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_state() {
        let err = Cli::try_parse_from(["ecplink", "set", "1", "maybe"])
            .expect_err("state must be on or off");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn rejects_out_of_range_logic_id() {
        let err = Cli::try_parse_from(["ecplink", "get", "70000"])
            .expect_err("logic id is 16-bit");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn global_console_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "ecplink",
            "watch",
            "--logic",
            "1,2,3",
            "--port",
            "4008",
            "--count",
            "5",
        ])
        .expect("watch args should parse");

        assert_eq!(cli.console.port, Some(4008));
        match cli.command {
            Command::Watch(args) => {
                assert_eq!(args.logic, Some(vec![1, 2, 3]));
                assert_eq!(args.count, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_get_timeout() {
        let cli = Cli::try_parse_from(["ecplink", "get", "7", "--timeout", "500ms"])
            .expect("get args should parse");
        assert!(matches!(cli.command, Command::Get(_)));
    }
}
