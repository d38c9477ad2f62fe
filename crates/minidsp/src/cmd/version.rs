use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("minidsp {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: minidsp");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("MINIDSP_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: usb={}, cli=true",
        cfg!(feature = "usb"),
    );
    println!(
        "usb_ids: {:04x}:{:04x}",
        minidsp_transport::USB_VENDOR_ID,
        minidsp_transport::USB_PRODUCT_ID
    );

    Ok(SUCCESS)
}
