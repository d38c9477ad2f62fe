use clap::ValueEnum;
use minidsp_transport::{NetConfig, TransportKind, UsbConfig};

use crate::exit::{CliError, CliResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TransportArg {
    Usb,
    Net,
}

impl TransportArg {
    pub fn kind(self) -> TransportKind {
        match self {
            TransportArg::Usb => TransportKind::Usb,
            TransportArg::Net => TransportKind::Net,
        }
    }
}

/// Transport parameters given as `--opt key=value[,key=value...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl TransportOptions {
    /// Parse `key=value` pairs. Later keys override earlier ones.
    pub fn parse<S: AsRef<str>>(pairs: &[S]) -> CliResult<Self> {
        let mut options = Self::default();
        for pair in pairs {
            let pair = pair.as_ref().trim();
            if pair.is_empty() {
                continue;
            }
            let Some((key, value)) = pair.split_once('=') else {
                return Err(CliError::usage(format!(
                    "transport option {pair:?} is not key=value"
                )));
            };
            let value = value.trim();
            match key.trim() {
                "host" => options.host = Some(value.to_string()),
                "port" => options.port = Some(parse_number(key, value)?),
                "path" => options.path = Some(value.to_string()),
                "vid" => options.vid = Some(parse_id(key, value)?),
                "pid" => options.pid = Some(parse_id(key, value)?),
                other => {
                    return Err(CliError::usage(format!(
                        "unknown transport option {other:?} (expected host, port, path, vid or pid)"
                    )))
                }
            }
        }
        Ok(options)
    }

    pub fn usb_config(&self) -> UsbConfig {
        let defaults = UsbConfig::default();
        UsbConfig {
            vendor_id: self.vid.unwrap_or(defaults.vendor_id),
            product_id: self.pid.unwrap_or(defaults.product_id),
            path: self.path.clone(),
            ..defaults
        }
    }

    pub fn net_config(&self) -> NetConfig {
        let defaults = NetConfig::default();
        NetConfig {
            host: self.host.clone().unwrap_or(defaults.host),
            port: self.port.unwrap_or(defaults.port),
            transport: defaults.transport,
        }
    }
}

fn parse_number(key: &str, value: &str) -> CliResult<u16> {
    value
        .parse()
        .map_err(|_| CliError::usage(format!("invalid {key}: {value:?}")))
}

/// USB ids are accepted in decimal or with a `0x` prefix.
fn parse_id(key: &str, value: &str) -> CliResult<u16> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|_| CliError::usage(format!("invalid {key}: {value:?}")))
}
