//! `cloudcam geo`: resolve a place name and print where it is.
//!
//! Uses the geocoder from the active configuration, so it doubles as a check
//! that the configured service is reachable. With `--save` the coordinates
//! are written back to the config (or `geo.toml`), which makes later runs
//! skip geocoding entirely.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::config::{self, Config};
use crate::geo::{GeoResolver, GeoSnapshot, GeoState, Geocoder};

/// Handle `cloudcam geo <query>`.
pub fn handle_geo_command(query: &str, save: bool, debug_enabled: bool) -> Result<()> {
    log_version!();

    let config = Config::load()?;
    if debug_enabled {
        log_pipe!();
        log_debug!("Using {} geocoder", config.geocoder().as_str());
    }
    let geocoder = crate::app::create_geocoder(&config)?;

    let snapshot = lookup(geocoder, query)?;
    report(&snapshot);

    if save {
        config::builder::update_coordinates(
            snapshot.position.latitude(),
            snapshot.position.longitude(),
        )
        .context("Failed to save coordinates")?;
    }

    log_end!();
    Ok(())
}

/// Resolve `query` with `geocoder` on the calling thread.
pub fn lookup(geocoder: Arc<dyn Geocoder>, query: &str) -> Result<Arc<GeoSnapshot>> {
    let resolver = GeoResolver::new(geocoder, Arc::new(GeoState::new()));
    resolver
        .resolve_blocking(query)
        .with_context(|| format!("Failed to resolve location '{query}'"))
}

fn report(snapshot: &GeoSnapshot) {
    log_block_start!("{}", snapshot.query);
    log_indented!("Coordinates: {}", snapshot.position);
    log_indented!("Timezone reference: {}", snapshot.timezone_reference);
}

/// Display detailed help for the geo command
pub fn display_help() {
    log_version!();
    log_block_start!("geo - Resolve a place name to coordinates");
    log_block_start!("Usage: cloudcam geo [OPTIONS] <location>");
    log_block_start!("Arguments:");
    log_indented!("<location>         Free-text place, e.g. \"Stanford, CA, USA\"");
    log_block_start!("Options:");
    log_indented!("-s, --save         Store the coordinates in the config file");
    log_indented!("-c, --config <dir> Use custom configuration directory");
    log_block_start!("Output:");
    log_indented!("Latitude and longitude with hemispheres, and the time-zone");
    log_indented!("reference meridian used for cloud detection");
    log_end!();
}
