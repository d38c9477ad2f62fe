use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Extra filter directives, `RUST_LOG` syntax (e.g. `minidsp_transport=trace`).
pub const LOG_ENV: &str = "MINIDSP_LOG";

/// Targets that `--log-level` applies to.
const TARGETS: [&str; 5] = [
    "minidsp",
    "minidsp_frame",
    "minidsp_transport",
    "minidsp_device",
    "minidsp_proxy",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Directive string: our crates at `level`, everything else no louder than
/// warn, then any `overrides` on top.
fn directives(level: LogLevel, overrides: Option<&str>) -> String {
    let others = match level {
        LogLevel::Info | LogLevel::Debug | LogLevel::Trace => LogLevel::Warn,
        quiet => quiet,
    };
    let mut out = others.directive().to_string();
    for target in TARGETS {
        out.push_str(&format!(",{target}={}", level.directive()));
    }
    if let Some(extra) = overrides.map(str::trim).filter(|s| !s.is_empty()) {
        out.push(',');
        out.push_str(extra);
    }
    out
}

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let overrides = std::env::var(LOG_ENV).ok();
    let filter = EnvFilter::builder().parse_lossy(directives(level, overrides.as_deref()));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(matches!(level, LogLevel::Debug | LogLevel::Trace));

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
