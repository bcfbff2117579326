//! On-demand SSH tunnel handlers.

use tokio::io::AsyncBufReadExt;

use soractl_api::ip_lookup;
use soractl_core::RemoteAccessSession;

use crate::AppContext;
use crate::cli::{GlobalOpts, TunnelArgs, TunnelCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    ctx: &AppContext,
    args: TunnelArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TunnelCommand::Open {
            device,
            duration,
            open_range,
            keep,
        } => {
            let catalog = util::load_catalog(ctx, false).await?;
            let device = util::resolve_device(&catalog, &device)?;

            let source_range = if open_range {
                None
            } else {
                ip_lookup::discover_source_range().await
            };

            let mut session = RemoteAccessSession::new(&ctx.api).with_duration(duration);
            let conn = session
                .open(&device, source_range)
                .await
                .map_err(|e| ctx.map_core(e))?;

            output::print_output(
                &format!(
                    "Tunnel to {} open for {duration}s\n\
                     Endpoint: {}:{}\n\
                     Connect:  ssh pi@{} -p {}",
                    device.display_name(),
                    conn.hostname,
                    conn.port,
                    conn.hostname,
                    conn.port
                ),
                global.quiet,
            );

            if keep {
                output::print_output(
                    "Left open; it expires server-side after the duration.",
                    global.quiet,
                );
                return Ok(());
            }

            output::print_output("Press Enter to close the tunnel...", global.quiet);
            wait_for_enter_or_interrupt().await;

            session.close().await.map_err(|e| {
                let detail = format!("{}", ctx.map_core(e));
                CliError::CleanupIncomplete {
                    device: device.display_name().to_owned(),
                    detail,
                }
            })?;
            output::print_output("Tunnel closed.", global.quiet);
            Ok(())
        }
    }
}

/// Block until the operator hits Enter or ctrl-c. Either way the caller
/// proceeds to close the tunnel.
async fn wait_for_enter_or_interrupt() {
    let mut line = String::new();
    let mut stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        _ = stdin.read_line(&mut line) => {}
        _ = tokio::signal::ctrl_c() => {}
    }
}
