//! Time-zone-center longitude estimation.
//!
//! The detection oracle converts the wall-clock timestamp of a frame into solar
//! time using the longitude of the nominal zone meridian. Continental US
//! longitudes map onto the four standard zone meridians; everything else snaps
//! to the nearest multiple of 15°.

use std::fmt;

/// Which estimation branch produced a reference meridian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneBand {
    Eastern,
    Central,
    Mountain,
    Pacific,
    /// Nearest 15° meridian, used outside the continental US bands
    Meridian,
}

impl ZoneBand {
    pub fn name(&self) -> &'static str {
        match self {
            ZoneBand::Eastern => "Eastern",
            ZoneBand::Central => "Central",
            ZoneBand::Mountain => "Mountain",
            ZoneBand::Pacific => "Pacific",
            ZoneBand::Meridian => "Nearest meridian",
        }
    }
}

/// Nominal solar-noon meridian for a resolved location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimezoneReference {
    longitude: f64,
    band: ZoneBand,
}

impl TimezoneReference {
    /// Longitude of the zone meridian in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn band(&self) -> ZoneBand {
        self.band
    }
}

impl fmt::Display for TimezoneReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}° ({})", self.longitude, self.band.name())
    }
}

/// Map a longitude to its time-zone-center longitude.
///
/// Band edges are inclusive on the western side of each band except Eastern,
/// which includes both -85 and -67.
pub fn estimate_timezone_reference(longitude: f64) -> TimezoneReference {
    let (meridian, band) = if (-85.0..=-67.0).contains(&longitude) {
        (-75.0, ZoneBand::Eastern)
    } else if (-102.0..-85.0).contains(&longitude) {
        (-90.0, ZoneBand::Central)
    } else if (-115.0..-102.0).contains(&longitude) {
        (-105.0, ZoneBand::Mountain)
    } else if (-125.0..-115.0).contains(&longitude) {
        (-120.0, ZoneBand::Pacific)
    } else {
        ((longitude / 15.0).round() * 15.0, ZoneBand::Meridian)
    };

    TimezoneReference {
        // -0.0 from rounding small negative longitudes reads oddly in logs
        longitude: meridian + 0.0,
        band,
    }
}
