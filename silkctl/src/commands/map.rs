//! Showing the marker set of the location map
use crate::{
    cli::OutputOptions,
    config::Config,
    output::{self, rows::MarkerRow},
};
use anyhow::Result;
use libsilk::{
    markers::{MarkerSync, SyncState, tiles::tile_at},
    session::Session,
    store::SqliteStore,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

fn print_markers(map: &MarkerSync, output: &OutputOptions) -> Result<()> {
    let zoom = map.view().zoom;
    let str = output::format_seq(
        map.markers()
            .iter()
            .map(|m| MarkerRow::new(m, tile_at(m.position, zoom))),
        output.format.clone(),
    )?;
    println!("{str}");
    if let Some(err) = map.last_error() {
        eprintln!("Showing markers from an earlier refresh: {err}");
    }
    Ok(())
}

/// Handle the `silkctl map` command
pub(crate) async fn handle_command(
    refresh: Option<u64>,
    output: OutputOptions,
    cfg: &Config,
    session: &Session,
    store: SqliteStore,
) -> Result<()> {
    let tiles = cfg.tiles.clone().unwrap_or_default().build()?;
    let mut map = MarkerSync::new(Arc::new(store), tiles).with_view(cfg.view.unwrap_or_default());
    debug!(tiles = ?map.tiles(), view = ?map.view(), "mounting map");
    println!(
        "Tiles: {} ({})",
        map.tiles().tile_url(0, 0, 0),
        map.tiles().attribution()
    );
    map.mount().await;
    print_markers(&map, &output)?;

    let Some(secs) = refresh else {
        return Ok(());
    };
    let mut events = session.subscribe();
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    // the first tick completes immediately
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let SyncState::Ready { stale } = map.refresh().await {
                    info!(stale, count = map.markers().len(), "refreshed markers");
                }
                print_markers(&map, &output)?;
            }
            Some(state) = map.follow_session(&mut events) => {
                debug!(?state, "markers reloaded for new session");
                print_markers(&map, &output)?;
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("stopping map refresh");
                return Ok(());
            }
        }
    }
}
