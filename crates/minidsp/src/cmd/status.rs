use minidsp_device::DeviceClient;

use crate::cmd::Context;
use crate::exit::{device_error, CliResult, SUCCESS};
use crate::output::{print_status, StatusOutput};

pub async fn run(context: &Context) -> CliResult<i32> {
    let status = context.with_device(read_status).await?;
    print_status(&status, context.format);
    Ok(SUCCESS)
}

async fn read_status(dsp: DeviceClient) -> CliResult<StatusOutput> {
    let master = dsp
        .get_master_status()
        .await
        .map_err(|err| device_error("status read failed", err))?;
    let source = dsp
        .get_source()
        .await
        .map_err(|err| device_error("source read failed", err))?;
    Ok(StatusOutput::new(master, source))
}
