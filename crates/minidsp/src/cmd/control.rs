use minidsp_device::{commands, DeviceClient, Source};
use tracing::info;

use crate::cmd::{ConfigArgs, Context, GainArgs, InputArgs, MuteArgs};
use crate::exit::{device_error, CliResult, SUCCESS};

// Arguments are validated before the device is opened, so a typo never
// touches the link.

pub async fn input(args: InputArgs, context: &Context) -> CliResult<i32> {
    let source: Source = args
        .source
        .parse()
        .map_err(|err| device_error("invalid input source", err))?;

    context
        .with_device(|dsp| async move {
            dsp.set_source(source)
                .await
                .map_err(|err| device_error("set input failed", err))
        })
        .await?;
    info!(%source, "input source set");
    Ok(SUCCESS)
}

pub async fn config(args: ConfigArgs, context: &Context) -> CliResult<i32> {
    commands::set_config(args.index).map_err(|err| device_error("invalid preset", err))?;

    context
        .with_device(|dsp| async move {
            dsp.set_config(args.index)
                .await
                .map_err(|err| device_error("set config failed", err))
        })
        .await?;
    Ok(SUCCESS)
}

pub async fn mute(args: MuteArgs, context: &Context) -> CliResult<i32> {
    let muted = args.state.enabled();
    context
        .with_device(|dsp| async move {
            dsp.set_mute(muted)
                .await
                .map_err(|err| device_error("set mute failed", err))
        })
        .await?;
    Ok(SUCCESS)
}

pub async fn gain(args: GainArgs, context: &Context) -> CliResult<i32> {
    let db = args.db;
    commands::set_volume(db).map_err(|err| device_error("invalid gain", err))?;

    context
        .with_device(|dsp| async move {
            dsp.set_volume(db)
                .await
                .map_err(|err| device_error("set gain failed", err))
        })
        .await?;
    Ok(SUCCESS)
}

/// Both inputs, one after the other.
pub async fn input_gain(args: GainArgs, context: &Context) -> CliResult<i32> {
    let db = args.db;
    commands::set_input_gain(1, db).map_err(|err| device_error("invalid input gain", err))?;

    context
        .with_device(|dsp| set_input_gains(dsp, db))
        .await?;
    Ok(SUCCESS)
}

async fn set_input_gains(dsp: DeviceClient, db: f32) -> CliResult<()> {
    for index in [1, 2] {
        let input = dsp
            .get_input(index)
            .map_err(|err| device_error("input lookup failed", err))?;
        input
            .set_gain(db)
            .await
            .map_err(|err| device_error(&format!("set input {index} gain failed"), err))?;
    }
    Ok(())
}
