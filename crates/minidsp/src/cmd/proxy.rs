use minidsp_proxy::{ProxyBridge, ProxyConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cmd::{Context, ProxyArgs};
use crate::exit::{transport_error, CliError, CliResult, SUCCESS, TRANSPORT_ERROR};

pub async fn run(args: ProxyArgs, context: &Context) -> CliResult<i32> {
    let transport = context.open_transport().await?;
    let config = ProxyConfig { bind: args.bind };
    let bridge = ProxyBridge::bind(transport.clone(), &config)
        .await
        .map_err(|err| transport_error(&format!("cannot listen on {}", config.bind), err))?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted");
                shutdown.cancel();
            }
        }
    });

    bridge
        .run(shutdown)
        .await
        .map_err(|err| transport_error("proxy failed", err))?;

    // Either interrupted, or the device went away underneath us.
    if transport.is_closed() {
        return Err(CliError::new(TRANSPORT_ERROR, "device link closed"));
    }
    transport.close();
    Ok(SUCCESS)
}
