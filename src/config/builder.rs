//! Default config creation and in-place coordinate updates.
//!
//! The default file is generated with [`ConfigBuilder`] so that every setting
//! carries an aligned comment describing its accepted values.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::get_config_path;
use crate::common::constants::*;
use crate::common::utils::private_path;

/// Write a commented default `cloudcam.toml` to `path`, creating parent
/// directories as needed.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write default config to {}", private_path(path)))
}

fn default_config_content() -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Location")
        .add_setting(
            "location",
            &format!("\"{DEFAULT_LOCATION}\""),
            "Place name to geocode when no coordinates are set",
        )
        .add_setting(
            "geocoder",
            &format!("\"{}\"", DEFAULT_GEOCODER.as_str()),
            "Geocoding backend: \"nominatim\" or \"offline\"",
        )
        .add_setting(
            "geocode_timeout",
            &DEFAULT_GEOCODE_TIMEOUT.to_string(),
            &format!(
                "Geocoding request timeout ({MINIMUM_GEOCODE_TIMEOUT}-{MAXIMUM_GEOCODE_TIMEOUT}) seconds"
            ),
        )
        .add_section("Camera")
        .add_setting(
            "camera_source",
            &format!("\"{}\"", DEFAULT_CAMERA_SOURCE.as_str()),
            "Frame source: \"synthetic\" or \"sequence\" (needs frames_dir)",
        )
        .add_setting(
            "camera_index",
            &DEFAULT_CAMERA_INDEX.to_string(),
            &format!("Device index to open (0-{MAXIMUM_CAMERA_INDEX})"),
        )
        .add_setting(
            "capture_width",
            &DEFAULT_CAPTURE_WIDTH.to_string(),
            "Requested capture width in pixels",
        )
        .add_setting(
            "capture_height",
            &DEFAULT_CAPTURE_HEIGHT.to_string(),
            "Requested capture height in pixels",
        )
        .add_setting(
            "tick_interval",
            &DEFAULT_TICK_INTERVAL.to_string(),
            &format!(
                "Pause between frames ({MINIMUM_TICK_INTERVAL}-{MAXIMUM_TICK_INTERVAL}) milliseconds"
            ),
        )
        .add_section("Detection")
        .add_setting(
            "detection_size",
            &DEFAULT_DETECTION_SIZE.to_string(),
            &format!(
                "Square detector input ({MINIMUM_DETECTION_SIZE}-{MAXIMUM_DETECTION_SIZE}) pixels"
            ),
        )
        .add_setting(
            "cloud_ratio",
            &format!("{DEFAULT_CLOUD_RATIO:.2}"),
            "Red/blue ratio at which a sky pixel counts as cloud",
        )
        .add_section("Display")
        .add_setting(
            "display_width",
            &DEFAULT_DISPLAY_WIDTH.to_string(),
            "Width of published frames in pixels",
        )
        .add_setting(
            "display_height",
            &DEFAULT_DISPLAY_HEIGHT.to_string(),
            "Height of published frames in pixels",
        )
        .add_setting(
            "sun_opacity",
            &format!("{DEFAULT_SUN_OPACITY:.2}"),
            "Sun mask blend weight (0.0-1.0)",
        )
        .add_setting(
            "cloud_opacity",
            &format!("{DEFAULT_CLOUD_OPACITY:.2}"),
            "Cloud mask blend weight (0.0-1.0)",
        )
        .add_setting(
            "boundary_opacity",
            &format!("{DEFAULT_BOUNDARY_OPACITY:.2}"),
            "Cloud boundary blend weight (0.0-1.0)",
        )
        .build();
    content.push('\n');
    content
}

/// Store resolved coordinates in the active config directory.
pub fn update_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    let config_path = get_config_path()?;
    let Some(config_dir) = config_path.parent() else {
        anyhow::bail!("Config path has no parent directory");
    };
    update_coords_in_dir(config_dir, latitude, longitude)
}

/// Store coordinates in `geo.toml` if present, otherwise in `cloudcam.toml`.
///
/// Existing `latitude`/`longitude` lines keep their trailing comments; missing
/// ones are appended.
pub fn update_coords_in_dir(config_dir: &Path, latitude: f64, longitude: f64) -> Result<()> {
    let config_path = config_dir.join(CONFIG_FILE_NAME);
    let geo_path = config_dir.join("geo.toml");

    if !config_path.exists() {
        anyhow::bail!(
            "No existing config file found at {}",
            private_path(&config_path)
        );
    }

    if geo_path.exists() {
        let geo_content = format!(
            "#[Private geo coordinates]\nlatitude = {latitude:.6}\nlongitude = {longitude:.6}\n"
        );
        fs::write(&geo_path, geo_content)
            .with_context(|| format!("Failed to write coordinates to {}", private_path(&geo_path)))?;

        log_block_start!("Updated geo coordinates in {}", private_path(&geo_path));
        log_indented!("Latitude: {latitude:.6}");
        log_indented!("Longitude: {longitude:.6}");
        return Ok(());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config from {}", private_path(&config_path)))?;

    let mut updated = content.clone();
    let mut appended = String::new();
    for (key, value) in [
        ("latitude", format!("{latitude:.6}")),
        ("longitude", format!("{longitude:.6}")),
    ] {
        match find_config_line(&content, key) {
            Some(line) => {
                let new_line = preserve_comment_formatting(&line, key, &value);
                updated = updated.replace(&line, &new_line);
            }
            None => appended.push_str(&format!("{key} = {value}\n")),
        }
    }

    if !appended.is_empty() {
        if !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&appended);
    }

    fs::write(&config_path, updated).with_context(|| {
        format!(
            "Failed to write updated config to {}",
            private_path(&config_path)
        )
    })?;

    log_block_start!("Updated coordinates in {}", private_path(&config_path));
    log_indented!("Latitude: {latitude:.6}");
    log_indented!("Longitude: {longitude:.6}");
    Ok(())
}

/// Builds TOML text with section markers and column-aligned comments.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        let column = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut lines = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !lines.is_empty() {
                        lines.push(String::new());
                    }
                    lines.push(title);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(column - line.len());
                    lines.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        lines.join("\n")
    }
}

/// First uncommented line assigning `key`.
pub(crate) fn find_config_line(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with('#')
                && trimmed
                    .split_once('=')
                    .is_some_and(|(name, _)| name.trim() == key)
        })
        .map(str::to_string)
}

/// Replace the value on `original_line`, keeping the spacing before its comment.
pub(crate) fn preserve_comment_formatting(
    original_line: &str,
    key: &str,
    new_value: &str,
) -> String {
    let key_value = format!("{key} = {new_value}");

    let Some(comment_pos) = original_line.find('#') else {
        return key_value;
    };
    let before_comment = &original_line[..comment_pos];
    let spacing = match before_comment.rfind(|c: char| !c.is_whitespace()) {
        Some(last) => &before_comment[last + 1..],
        None => " ",
    };

    format!("{key_value}{spacing}{}", &original_line[comment_pos..])
}
