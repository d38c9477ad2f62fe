use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use minidsp_device::{ClientConfig, DeviceClient};
use minidsp_transport::{NetTransport, Transport, TransportKind, UsbTransport};

use crate::exit::{io_error, transport_error, CliError, CliResult, USAGE};
use crate::options::{TransportArg, TransportOptions};
use crate::output::OutputFormat;

pub mod control;
pub mod devices;
pub mod monitor;
pub mod proxy;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List attached devices.
    Devices,
    /// Show master volume, mute state and input source.
    Status,
    /// Set the input source [analog|toslink|usb].
    Input(InputArgs),
    /// Load a configuration preset [0-3].
    Config(ConfigArgs),
    /// Set the global mute flag.
    Mute(MuteArgs),
    /// Set the master volume (-127 dB to 0 dB).
    Gain(GainArgs),
    /// Set the gain of both inputs (-127 dB to 12 dB).
    InputGain(GainArgs),
    /// Print input levels periodically.
    Monitor(MonitorArgs),
    /// Share the device with network clients.
    Proxy(ProxyArgs),
    /// Show version information.
    Version(VersionArgs),
}

/// Global options every command runs with.
#[derive(Debug)]
pub struct Context {
    pub transport: TransportArg,
    pub options: TransportOptions,
    pub request_timeout: Duration,
    pub format: OutputFormat,
}

impl Context {
    pub async fn open_transport(&self) -> CliResult<Transport> {
        match self.transport.kind() {
            TransportKind::Usb => UsbTransport::open(&self.options.usb_config())
                .map_err(|err| transport_error("cannot open USB device", err)),
            TransportKind::Net => {
                let config = self.options.net_config();
                NetTransport::connect(&config).await.map_err(|err| {
                    transport_error(&format!("cannot connect to {}", config.addr()), err)
                })
            }
        }
    }

    pub async fn open_device(&self) -> CliResult<DeviceClient> {
        let transport = self.open_transport().await?;
        let config = ClientConfig {
            request_timeout: Some(self.request_timeout),
            ..ClientConfig::default()
        };
        Ok(DeviceClient::new(transport, config))
    }

    /// Run `op` against a freshly opened device, closing it afterwards.
    pub async fn with_device<T, F, Fut>(&self, op: F) -> CliResult<T>
    where
        F: FnOnce(DeviceClient) -> Fut,
        Fut: Future<Output = CliResult<T>>,
    {
        let dsp = self.open_device().await?;
        let result = op(dsp.clone()).await;
        dsp.close();
        result
    }
}

pub fn run(command: Command, context: Context) -> CliResult<i32> {
    let command = match command {
        Command::Version(args) => return version::run(args),
        other => other,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("failed to start async runtime", err))?;
    runtime.block_on(run_async(command, &context))
}

async fn run_async(command: Command, context: &Context) -> CliResult<i32> {
    match command {
        Command::Devices => devices::run(context),
        Command::Status => status::run(context).await,
        Command::Input(args) => control::input(args, context).await,
        Command::Config(args) => control::config(args, context).await,
        Command::Mute(args) => control::mute(args, context).await,
        Command::Gain(args) => control::gain(args, context).await,
        Command::InputGain(args) => control::input_gain(args, context).await,
        Command::Monitor(args) => monitor::run(args, context).await,
        Command::Proxy(args) => proxy::run(args, context).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Source name or index.
    pub source: String,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Preset index.
    pub index: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum MuteState {
    On,
    Off,
}

impl MuteState {
    pub fn enabled(self) -> bool {
        self == MuteState::On
    }
}

#[derive(Args, Debug)]
pub struct MuteArgs {
    #[arg(value_enum, default_value = "on")]
    pub state: MuteState,
}

#[derive(Args, Debug)]
pub struct GainArgs {
    /// Gain in dB.
    #[arg(allow_negative_numbers = true)]
    pub db: f32,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Stop after N readings.
    #[arg(long)]
    pub count: Option<usize>,
    /// Time between readings (e.g. 42ms, 1s).
    #[arg(long, default_value = "42ms")]
    pub interval: String,
}

#[derive(Args, Debug)]
pub struct ProxyArgs {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:5333")]
    pub bind: SocketAddr,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }
}
