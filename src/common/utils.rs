//! Small formatting helpers shared by logging and the CLI.

use std::path::Path;

/// Display a path with the home directory replaced by `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Format a coordinate pair with hemisphere letters, e.g. `37.424°N, 122.170°W`.
pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
    let lat_dir = if latitude >= 0.0 { "N" } else { "S" };
    let lon_dir = if longitude >= 0.0 { "E" } else { "W" };
    format!(
        "{:.3}°{}, {:.3}°{}",
        latitude.abs(),
        lat_dir,
        longitude.abs(),
        lon_dir
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coordinates_hemispheres() {
        assert_eq!(format_coordinates(37.4241, -122.1661), "37.424°N, 122.166°W");
        assert_eq!(format_coordinates(-33.8688, 151.2093), "33.869°S, 151.209°E");
    }

    #[test]
    fn test_private_path_outside_home() {
        assert_eq!(private_path(Path::new("/tmp/frames")), "/tmp/frames");
    }
}
