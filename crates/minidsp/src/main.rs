mod cmd;
mod exit;
mod logging;
mod options;
mod output;

use clap::Parser;

use crate::cmd::{Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::options::{TransportArg, TransportOptions};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "minidsp", version, about = "Control a miniDSP 2x4HD")]
struct Cli {
    /// Link to the device.
    #[arg(
        long,
        short = 't',
        value_name = "TRANSPORT",
        default_value = "usb",
        env = "MINIDSP_TRANSPORT",
        global = true
    )]
    transport: TransportArg,

    /// Transport parameters: host, port (net); path, vid, pid (usb).
    #[arg(
        long,
        short = 'o',
        value_name = "KEY=VALUE",
        value_delimiter = ',',
        global = true
    )]
    opt: Vec<String>,

    /// How long to wait for each device response (e.g. 2s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "2s", global = true)]
    timeout: String,

    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr). MINIDSP_LOG adds per-target directives.
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn context(&self) -> exit::CliResult<Context> {
        Ok(Context {
            transport: self.transport,
            options: TransportOptions::parse(&self.opt)?,
            request_timeout: cmd::parse_duration(&self.timeout)?,
            format: self.format.unwrap_or_else(OutputFormat::default_for_stdout),
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let result = cli
        .context()
        .and_then(|context| cmd::run(cli.command, context));

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
    fn parses_negative_gain() {
        let cli = Cli::try_parse_from(["minidsp", "gain", "-20"]).expect("gain should parse");
        match cli.command {
            Command::Gain(args) => assert_eq!(args.db, -20.0),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_global_transport_options() {
        let cli = Cli::try_parse_from([
            "minidsp",
            "status",
            "--transport",
            "net",
            "--opt",
            "host=10.0.0.2,port=5333",
        ])
        .expect("status args should parse");

        assert_eq!(cli.transport, TransportArg::Net);
        let context = cli.context().expect("context should build");
        assert_eq!(context.options.net_config().addr(), "10.0.0.2:5333");
    }

    #[test]
    fn mute_defaults_to_on() {
        let cli = Cli::try_parse_from(["minidsp", "mute"]).expect("mute should parse");
        match cli.command {
            Command::Mute(args) => assert!(args.state.enabled()),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_transport() {
        let err = Cli::try_parse_from(["minidsp", "--transport", "serial", "status"])
            .expect_err("unknown transport should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn bad_timeout_is_usage_error() {
        let cli = Cli::try_parse_from(["minidsp", "--timeout", "soon", "status"])
            .expect("timeout is parsed later");
        let err = cli.context().expect_err("timeout should be rejected");
        assert_eq!(err.code, exit::USAGE);
    }
}
