use crate::cmd::Context;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::print_devices;

pub fn run(context: &Context) -> CliResult<i32> {
    let kind = context.transport.kind();
    let devices = kind
        .probe(&context.options.usb_config())
        .map_err(|err| transport_error(&format!("{kind} probe failed"), err))?;

    print_devices(&devices, context.format);
    Ok(SUCCESS)
}
