//! Configuration validation functionality.
//!
//! Rejects values the pipeline cannot run with before anything is opened:
//! out-of-range sizes and intervals, half-specified coordinates and a
//! sequence source without frames.

use anyhow::Result;

use super::{CameraSourceKind, Config};
use crate::common::constants::*;

/// Validate every field of `config`, failing on the first problem found.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_location(config)?;
    validate_camera(config)?;
    validate_detection(config)?;
    validate_display(config)?;
    validate_snapshots(config)?;
    Ok(())
}

fn validate_location(config: &Config) -> Result<()> {
    match (config.latitude, config.longitude) {
        (Some(_), None) | (None, Some(_)) => {
            anyhow::bail!("latitude and longitude must be specified together");
        }
        _ => {}
    }

    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if let Some(location) = &config.location
        && location.trim().is_empty()
    {
        anyhow::bail!("location must not be empty");
    }

    if let Some(url) = &config.geocoder_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        anyhow::bail!("geocoder_url must be an http:// or https:// URL (got {})", url);
    }

    if let Some(timeout) = config.geocode_timeout
        && !(MINIMUM_GEOCODE_TIMEOUT..=MAXIMUM_GEOCODE_TIMEOUT).contains(&timeout)
    {
        anyhow::bail!(
            "geocode_timeout ({} seconds) must be between {} and {} seconds",
            timeout,
            MINIMUM_GEOCODE_TIMEOUT,
            MAXIMUM_GEOCODE_TIMEOUT
        );
    }

    Ok(())
}

fn validate_camera(config: &Config) -> Result<()> {
    if config.camera_source() == CameraSourceKind::Sequence && config.frames_dir.is_none() {
        anyhow::bail!("camera_source = \"sequence\" requires frames_dir to be specified");
    }

    if let Some(index) = config.camera_index
        && index > MAXIMUM_CAMERA_INDEX
    {
        anyhow::bail!(
            "camera_index ({}) must be between 0 and {}",
            index,
            MAXIMUM_CAMERA_INDEX
        );
    }

    validate_dimension(
        "capture_width",
        config.capture_width,
        MINIMUM_CAPTURE_DIMENSION,
        MAXIMUM_CAPTURE_WIDTH,
    )?;
    validate_dimension(
        "capture_height",
        config.capture_height,
        MINIMUM_CAPTURE_DIMENSION,
        MAXIMUM_CAPTURE_HEIGHT,
    )?;

    if let Some(interval) = config.tick_interval
        && !(MINIMUM_TICK_INTERVAL..=MAXIMUM_TICK_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "tick_interval ({} ms) must be between {} and {} milliseconds",
            interval,
            MINIMUM_TICK_INTERVAL,
            MAXIMUM_TICK_INTERVAL
        );
    }

    Ok(())
}

fn validate_detection(config: &Config) -> Result<()> {
    if let Some(size) = config.detection_size
        && !(MINIMUM_DETECTION_SIZE..=MAXIMUM_DETECTION_SIZE).contains(&size)
    {
        anyhow::bail!(
            "detection_size ({}) must be between {} and {} pixels",
            size,
            MINIMUM_DETECTION_SIZE,
            MAXIMUM_DETECTION_SIZE
        );
    }

    if let Some(ratio) = config.cloud_ratio
        && !(MINIMUM_CLOUD_RATIO..=MAXIMUM_CLOUD_RATIO).contains(&ratio)
    {
        anyhow::bail!(
            "cloud_ratio ({}) must be between {} and {}",
            ratio,
            MINIMUM_CLOUD_RATIO,
            MAXIMUM_CLOUD_RATIO
        );
    }

    Ok(())
}

fn validate_display(config: &Config) -> Result<()> {
    validate_dimension(
        "display_width",
        config.display_width,
        MINIMUM_DISPLAY_DIMENSION,
        MAXIMUM_DISPLAY_WIDTH,
    )?;
    validate_dimension(
        "display_height",
        config.display_height,
        MINIMUM_DISPLAY_DIMENSION,
        MAXIMUM_DISPLAY_HEIGHT,
    )?;

    for (name, value) in [
        ("sun_opacity", config.sun_opacity),
        ("cloud_opacity", config.cloud_opacity),
        ("boundary_opacity", config.boundary_opacity),
    ] {
        if let Some(opacity) = value
            && !(0.0..=1.0).contains(&opacity)
        {
            anyhow::bail!("{} ({}) must be between 0.0 and 1.0", name, opacity);
        }
    }

    Ok(())
}

fn validate_snapshots(config: &Config) -> Result<()> {
    if let Some(every) = config.snapshot_every
        && !(MINIMUM_SNAPSHOT_EVERY..=MAXIMUM_SNAPSHOT_EVERY).contains(&every)
    {
        anyhow::bail!(
            "snapshot_every ({}) must be between {} and {} frames",
            every,
            MINIMUM_SNAPSHOT_EVERY,
            MAXIMUM_SNAPSHOT_EVERY
        );
    }
    Ok(())
}

fn validate_dimension(name: &str, value: Option<u32>, min: u32, max: u32) -> Result<()> {
    if let Some(v) = value
        && !(min..=max).contains(&v)
    {
        anyhow::bail!("{} ({}) must be between {} and {} pixels", name, v, min, max);
    }
    Ok(())
}
