//! Speed-class command handlers.

use soractl_core::set_speed_class;

use crate::AppContext;
use crate::cli::{GlobalOpts, SpeedArgs, SpeedCommand};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(
    ctx: &AppContext,
    args: SpeedArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SpeedCommand::Set { device, class } => {
            let catalog = util::load_catalog(ctx, false).await?;
            let device = util::resolve_device(&catalog, &device)?;

            set_speed_class(&ctx.api, &device, class)
                .await
                .map_err(|e| ctx.map_core(e))?;

            output::print_output(
                &format!("{} set to {class}", device.display_name()),
                global.quiet,
            );
            Ok(())
        }
    }
}
