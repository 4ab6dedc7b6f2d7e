//! `show interfaces counters rif`.

use crate::context::ShowContext;
use crate::counters::{self, Snapshot, RIF_COUNTERS};
use crate::response::to_json;
use sonic_cli_dispatch::{CmdArgs, CommandError, CommandResult, OptionMap};
use std::sync::Arc;

pub async fn get_interface_rif_counters(
    ctx: Arc<ShowContext>,
    args: CmdArgs,
    options: OptionMap,
) -> CommandResult<Vec<u8>> {
    let facade = ctx.db.as_ref();
    let interface = Some(args.at(0)).filter(|s| !s.is_empty());

    counters::validate_period(&options, ctx.max_period)?;
    if let Some(name) = interface {
        let rif_names = counters::rif_name_map(facade).await?;
        if !rif_names.contains_key(name) {
            return Err(CommandError::invalid_argument(format!(
                "Interface {} not found in {}, Make sure it exists",
                name,
                counters::COUNTERS_RIF_NAME_MAP
            )));
        }
    }

    let snapshot = counters::sample(&ctx, &options, &RIF_COUNTERS, move || {
        counters::rif_snapshot(facade, interface)
    })
    .await?;
    to_json::<Snapshot>(&snapshot)
}
