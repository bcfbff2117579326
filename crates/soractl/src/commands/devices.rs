//! Device inventory command handlers.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::Tabled;

use soractl_core::Device;

use crate::AppContext;
use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "IMSI")]
    imsi: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "S/W Version")]
    version: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            name: d.display_name().to_owned(),
            imsi: d.identity().unwrap_or("-").to_owned(),
            state: if d.is_online() { "online" } else { "offline" }.to_owned(),
            version: d.software_version().unwrap_or("Unknown").to_owned(),
        }
    }
}

fn detail(d: &Device) -> String {
    [
        format!("Name:        {}", d.display_name()),
        format!("IMSI:        {}", d.identity().unwrap_or("-")),
        format!(
            "State:       {}",
            if d.is_online() { "online" } else { "offline" }
        ),
        format!("S/W Version: {}", d.software_version().unwrap_or("Unknown")),
        format!("IMEI:        {}", d.imei().unwrap_or("-")),
        format!("Last seen:   {}", util::format_timestamp(d.last_seen())),
    ]
    .join("\n")
}

fn id_of(d: &Arc<Device>) -> String {
    d.identity().unwrap_or("-").to_owned()
}

fn print_devices(devices: &[Arc<Device>], global: &GlobalOpts) {
    let rendered = output::render_list(&global.output, devices, |d| DeviceRow::from(d), id_of);
    output::print_output(&rendered, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    ctx: &AppContext,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List {
            online,
            offline,
            refresh,
        } => {
            let catalog = util::load_catalog(ctx, refresh).await?;
            let devices = if online {
                catalog.online()
            } else if offline {
                catalog.offline()
            } else {
                catalog.all()
            };
            print_devices(devices, global);
            Ok(())
        }

        DevicesCommand::Search { query, refresh } => {
            let catalog = util::load_catalog(ctx, refresh).await?;
            let matches = catalog.search(&query);
            if matches.is_empty() {
                return Err(CliError::DeviceNotFound { query });
            }
            print_devices(&matches, global);
            Ok(())
        }

        DevicesCommand::Show { device, refresh } => {
            let catalog = util::load_catalog(ctx, refresh).await?;
            let device = util::resolve_device(&catalog, &device)?;

            let rendered =
                output::render_single(&global.output, &device, |d| detail(d), |d| id_of(d));
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        DevicesCommand::Summary { refresh } => {
            let catalog = util::load_catalog(ctx, refresh).await?;
            let counts = catalog.counts();

            let summary = serde_json::json!({
                "total": counts.total,
                "online": counts.online,
                "offline": counts.offline,
            });
            let rendered = output::render_single(
                &global.output,
                &summary,
                |_| {
                    if output::should_color(&global.color) {
                        format!(
                            "Total:   {}\nOnline:  {}\nOffline: {}",
                            counts.total,
                            counts.online.green(),
                            counts.offline.red()
                        )
                    } else {
                        format!(
                            "Total:   {}\nOnline:  {}\nOffline: {}",
                            counts.total, counts.online, counts.offline
                        )
                    }
                },
                |_| format!("{} {} {}", counts.total, counts.online, counts.offline),
            );
            output::print_output(&rendered, global.quiet);
            Ok(())
        }
    }
}
