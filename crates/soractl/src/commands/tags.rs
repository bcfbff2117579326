//! Tag command handlers.

use tabled::Tabled;

use crate::AppContext;
use crate::cli::{GlobalOpts, TagsArgs, TagsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled, serde::Serialize)]
struct TagRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(ctx: &AppContext, args: TagsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TagsCommand::List { device } => {
            let catalog = util::load_catalog(ctx, false).await?;
            let (_, imsi) = util::resolve_identified(&catalog, &device)?;

            // Re-fetch the single record: the cached copy may be stale.
            let record = ctx
                .api
                .get_subscriber(&imsi)
                .await
                .map_err(|e| ctx.map_api(e))?;

            let mut rows: Vec<TagRow> = record.tags().map_or_else(Vec::new, |tags| {
                tags.iter()
                    .map(|(name, value)| TagRow {
                        name: name.clone(),
                        value: value.as_str().map_or_else(|| value.to_string(), str::to_owned),
                    })
                    .collect()
            });
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let rendered =
                output::render_list(&global.output, &rows, |r| TagRow {
                    name: r.name.clone(),
                    value: r.value.clone(),
                }, |r| r.name.clone());
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        TagsCommand::Set {
            device,
            name,
            value,
        } => {
            let catalog = util::load_catalog(ctx, false).await?;
            let (device, imsi) = util::resolve_identified(&catalog, &device)?;

            ctx.api
                .put_tag(&imsi, &name, &value)
                .await
                .map_err(|e| ctx.map_api(e))?;
            output::print_output(
                &format!("Tag '{name}' set on {}", device.display_name()),
                global.quiet,
            );
            Ok(())
        }

        TagsCommand::Delete { device, name } => {
            let catalog = util::load_catalog(ctx, false).await?;
            let (device, imsi) = util::resolve_identified(&catalog, &device)?;

            ctx.api
                .delete_tag(&imsi, &name)
                .await
                .map_err(|e| ctx.map_api(e))?;
            output::print_output(
                &format!("Tag '{name}' deleted from {}", device.display_name()),
                global.quiet,
            );
            Ok(())
        }
    }
}
