use cloudcam::geo::{ZoneBand, estimate_timezone_reference};
use proptest::prelude::*;

/// Generate valid longitude values
fn longitude_strategy() -> impl Strategy<Value = f64> {
    -180.0..=180.0
}

/// Longitudes outside every named North American band
fn meridian_longitude_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![-180.0..-125.0, -67.0f64..=180.0]
        .prop_filter("Eastern band includes -67", |lon| *lon != -67.0)
}

proptest! {
    /// Every reference is a whole multiple of 15 degrees within the globe
    #[test]
    fn test_reference_is_multiple_of_fifteen(lon in longitude_strategy()) {
        let reference = estimate_timezone_reference(lon).longitude();

        prop_assert_eq!(reference % 15.0, 0.0);
        prop_assert!((-180.0..=180.0).contains(&reference));
    }

    /// The reference is never further than half a zone from the input
    #[test]
    fn test_reference_within_half_zone_outside_bands(lon in meridian_longitude_strategy()) {
        let reference = estimate_timezone_reference(lon);

        prop_assert_eq!(reference.band(), ZoneBand::Meridian);
        prop_assert!((reference.longitude() - lon).abs() <= 7.5);
    }

    /// Named bands map to their fixed meridians
    #[test]
    fn test_named_bands(lon in -125.0f64..=-67.0) {
        let reference = estimate_timezone_reference(lon);
        let expected = match reference.band() {
            ZoneBand::Eastern => -75.0,
            ZoneBand::Central => -90.0,
            ZoneBand::Mountain => -105.0,
            ZoneBand::Pacific => -120.0,
            ZoneBand::Meridian => {
                return Err(TestCaseError::fail(format!("{lon} fell outside the bands")));
            }
        };
        prop_assert_eq!(reference.longitude(), expected);
    }

    /// Moving east never moves the reference west
    #[test]
    fn test_reference_is_monotonic(a in longitude_strategy(), b in longitude_strategy()) {
        let (west, east) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(
            estimate_timezone_reference(west).longitude()
                <= estimate_timezone_reference(east).longitude()
        );
    }
}
