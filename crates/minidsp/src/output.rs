use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use minidsp_device::{InputLevels, MasterStatus, Source};
use minidsp_transport::ProbedDevice;
use serde::Serialize;

/// Level shown as an empty meter.
const METER_FLOOR_DB: f32 = -127.0;
const METER_WIDTH: usize = 40;

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

#[derive(Serialize)]
struct DeviceOutput<'a> {
    path: &'a str,
    product: Option<&'a str>,
    serial: Option<&'a str>,
}

pub fn print_devices(devices: &[ProbedDevice], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<DeviceOutput<'_>> = devices
                .iter()
                .map(|device| DeviceOutput {
                    path: &device.path,
                    product: device.product.as_deref(),
                    serial: device.serial.as_deref(),
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["PATH", "PRODUCT", "SERIAL"]);
            for device in devices {
                table.add_row(vec![
                    device.path.clone(),
                    device.product.clone().unwrap_or_default(),
                    device.serial.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for device in devices {
                println!(
                    "{}\t{}",
                    device.path,
                    device.product.as_deref().unwrap_or("")
                );
            }
        }
    }
}

#[derive(Serialize)]
pub struct StatusOutput {
    pub volume_db: f32,
    pub muted: bool,
    pub source: Source,
}

impl StatusOutput {
    pub fn new(status: MasterStatus, source: Source) -> Self {
        Self {
            volume_db: status.volume_db,
            muted: status.muted,
            source,
        }
    }
}

pub fn print_status(status: &StatusOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(status),
        OutputFormat::Table => {
            let mut table = new_table(vec!["VOLUME", "MUTED", "SOURCE"]);
            table.add_row(vec![
                format!("{:.1} dB", status.volume_db),
                status.muted.to_string(),
                status.source.to_string(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "volume={:.1} dB muted={} source={}",
                status.volume_db, status.muted, status.source
            );
        }
    }
}

#[derive(Serialize)]
struct LevelsOutput {
    input1: f32,
    input2: f32,
    timestamp: String,
}

pub fn print_levels(levels: &InputLevels, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&LevelsOutput {
            input1: levels.input1,
            input2: levels.input2,
            timestamp: now_unix_seconds(),
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["INPUT", "LEVEL"]);
            for (i, level) in levels.as_array().iter().enumerate() {
                table.add_row(vec![(i + 1).to_string(), format!("{level:.1} dBFS")]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = levels
                .as_array()
                .iter()
                .enumerate()
                .map(|(i, level)| format!("{} [{}] {level:6.1} dBFS", i + 1, meter(*level)))
                .collect();
            println!("{}", line.join("  "));
        }
    }
}

/// Fill proportional to the level between the floor and 0 dBFS.
fn meter(level_db: f32) -> String {
    let fraction = if level_db.is_finite() {
        (1.0 - level_db / METER_FLOOR_DB).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * METER_WIDTH as f32).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(METER_WIDTH - filled))
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_scales_between_floor_and_full() {
        assert_eq!(meter(0.0), "#".repeat(METER_WIDTH));
        assert_eq!(meter(-127.0), "-".repeat(METER_WIDTH));
        assert_eq!(meter(-200.0), "-".repeat(METER_WIDTH));
        assert_eq!(meter(f32::NEG_INFINITY), "-".repeat(METER_WIDTH));

        let half = meter(-63.5);
        assert_eq!(half.matches('#').count(), METER_WIDTH / 2);
    }

    #[test]
    fn status_serializes_source_by_name() {
        let status = StatusOutput::new(
            MasterStatus {
                volume_db: -20.0,
                muted: false,
            },
            Source::Toslink,
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["source"], "toslink");
        assert_eq!(json["volume_db"], -20.0);
    }
}
