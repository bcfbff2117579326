//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod cache_cmd;
pub mod config_cmd;
pub mod devices;
pub mod speed;
pub mod tags;
pub mod tunnel;
pub mod update_cmd;
pub mod util;

use crate::AppContext;
use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &AppContext, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(ctx, args, global).await,
        Command::Tags(args) => tags::handle(ctx, args, global).await,
        Command::Speed(args) => speed::handle(ctx, args, global).await,
        Command::Tunnel(args) => tunnel::handle(ctx, args, global).await,
        Command::Update(args) => update_cmd::handle(ctx, args, global).await,
        // Config, Cache, and Completions are handled before dispatch
        Command::Config(_) | Command::Cache(_) | Command::Completions(_) => unreachable!(),
    }
}
