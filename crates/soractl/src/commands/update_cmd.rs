//! Software update orchestration handler.

use std::sync::Arc;

use dialoguer::Confirm;
use tracing::warn;

use soractl_api::ip_lookup;
use soractl_core::{CleanupContext, SshUpdateDriver, UpdateOrchestrator, UpdateStatus};

use crate::AppContext;
use crate::cli::{GlobalOpts, UpdateArgs, UpdateCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    ctx: &AppContext,
    args: UpdateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        UpdateCommand::Run {
            device,
            ssh_user,
            imsi,
            open_range,
        } => run(ctx, &device, &ssh_user, imsi, open_range, global).await,
    }
}

async fn run(
    ctx: &AppContext,
    query: &str,
    ssh_user: &str,
    manual_imsi: Option<String>,
    open_range: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Always resolve against a fresh inventory; a stale cache entry could
    // point the update at the wrong device.
    let catalog = util::load_catalog(ctx, true).await?;
    let mut device = util::resolve_device(&catalog, query)?;
    if let Some(imsi) = manual_imsi {
        if !soractl_core::is_valid_imsi(&imsi) {
            return Err(CliError::Validation {
                field: "imsi".into(),
                reason: format!("'{imsi}' is not a 15-digit IMSI"),
            });
        }
        device = Arc::new(device.with_identity(&imsi));
    }
    let name = device.display_name().to_owned();

    if !device.is_online() {
        return Err(CliError::Validation {
            field: "device".into(),
            reason: format!("'{name}' is offline; the update needs a live connection"),
        });
    }

    if !global.yes {
        let version = device.software_version().unwrap_or("unknown");
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Update {name} (current version: {version})? The device will reboot."
            ))
            .default(false)
            .interact()
            .map_err(|e| CliError::Validation {
                field: "interactive".into(),
                reason: format!("prompt failed: {e}"),
            })?;
        if !confirmed {
            output::print_output("Aborted.", global.quiet);
            return Ok(());
        }
    }

    let source_range = if open_range {
        None
    } else {
        ip_lookup::discover_source_range().await
    };

    // The interrupt handler shares the cleanup ledger: ctrl-c mid-run
    // releases exactly the resources acquired so far, then exits.
    let cleanup = Arc::new(CleanupContext::new());
    let interrupt = tokio::spawn({
        let cleanup = Arc::clone(&cleanup);
        let api = ctx.api.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted; releasing held resources");
                cleanup.release(&api).await;
                std::process::exit(130);
            }
        }
    });

    let driver = SshUpdateDriver::new(ssh_user, ctx.ssh_password.clone());
    let mut orchestrator = UpdateOrchestrator::new(&ctx.api, driver, Arc::clone(&cleanup))
        .with_source_range(source_range);

    let outcome = orchestrator
        .run_update(&device)
        .await
        .map_err(|e| ctx.map_core(e))?;

    interrupt.abort();

    if !outcome.speed_restored || !outcome.session_closed {
        let mut leftovers = Vec::new();
        if !outcome.speed_restored {
            leftovers.push("speed class still raised");
        }
        if !outcome.session_closed {
            leftovers.push("port mapping not deleted");
        }
        return Err(CliError::CleanupIncomplete {
            device: name,
            detail: leftovers.join("; "),
        });
    }

    match outcome.status {
        UpdateStatus::Succeeded => {
            output::print_output(
                &format!("{name}: update finished; the device is rebooting."),
                global.quiet,
            );
            Ok(())
        }
        UpdateStatus::AmbiguousTimeout => Err(CliError::AmbiguousUpdate { device: name }),
        UpdateStatus::Failed(reason) => Err(CliError::UpdateFailed {
            device: name,
            reason,
        }),
    }
}
