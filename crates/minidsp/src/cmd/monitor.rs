use std::time::Duration;

use minidsp_device::DeviceClient;
use tokio::time::MissedTickBehavior;

use crate::cmd::{parse_duration, Context, MonitorArgs};
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_levels, OutputFormat};

pub async fn run(args: MonitorArgs, context: &Context) -> CliResult<i32> {
    let interval = parse_duration(&args.interval)?;
    let count = args.count;
    let format = context.format;

    context
        .with_device(|dsp| watch_levels(dsp, interval, count, format))
        .await?;
    Ok(SUCCESS)
}

/// Poll until `count` readings were printed or the user interrupts.
async fn watch_levels(
    dsp: DeviceClient,
    interval: Duration,
    count: Option<usize>,
    format: OutputFormat,
) -> CliResult<()> {
    let mut ticker = tokio::time::interval(interval);
    // A slow device stretches the period instead of bursting.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let mut printed = 0usize;
    loop {
        tokio::select! {
            _ = &mut interrupted => return Ok(()),
            _ = ticker.tick() => {}
        }

        let levels = dsp
            .get_input_levels()
            .await
            .map_err(|err| device_error("level read failed", err))?;
        print_levels(&levels, format);

        printed = printed.saturating_add(1);
        if count.is_some_and(|count| printed >= count) {
            return Ok(());
        }
    }
}
