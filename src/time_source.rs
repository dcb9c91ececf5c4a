//! Time source abstraction for supporting both real-time and stepped time.
//!
//! The pipeline stamps every frame with "now" and hands that timestamp to the
//! detection oracle, which uses it as the solar-time reference. Replaying a
//! recorded image sequence therefore needs a clock that starts at the moment
//! the images were captured and advances one tick interval per frame. This
//! module provides that clock alongside the real one behind a single trait.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

/// Global time source instance, defaults to RealTimeSource
static TIME_SOURCE: OnceCell<Arc<dyn TimeSource>> = OnceCell::new();

/// Trait for abstracting time operations
pub trait TimeSource: Send + Sync {
    /// Get the current time
    fn now(&self) -> DateTime<Local>;

    /// Sleep for the specified duration (or simulate it)
    fn sleep(&self, duration: StdDuration);

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool;
}

/// Real-time implementation that uses actual system time
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: StdDuration) {
        std::thread::sleep(duration);
    }

    fn is_simulated(&self) -> bool {
        false
    }
}

/// Stepped clock for replaying recorded frames.
///
/// Time starts at `start` and only moves when `sleep` is called, by exactly
/// the requested duration. With real pacing enabled the call also blocks for
/// that duration so a replay runs at capture speed; without it the clock
/// fast-forwards, which is what tests want.
pub struct SteppedTimeSource {
    current: Mutex<DateTime<Local>>,
    real_pacing: bool,
}

impl SteppedTimeSource {
    /// Create a fast-forwarding clock starting at `start`.
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: Mutex::new(start),
            real_pacing: false,
        }
    }

    /// Also block the calling thread for each simulated sleep.
    pub fn with_real_pacing(mut self) -> Self {
        self.real_pacing = true;
        self
    }

    /// Move the clock forward without sleeping.
    pub fn advance(&self, duration: StdDuration) {
        let step = ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::zero());
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += step;
    }
}

impl TimeSource for SteppedTimeSource {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep(&self, duration: StdDuration) {
        if self.real_pacing {
            std::thread::sleep(duration);
        }
        self.advance(duration);
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Initialize the global time source (call once at startup)
pub fn init_time_source(source: Arc<dyn TimeSource>) {
    TIME_SOURCE.set(source).ok();
}

/// Get the global time source, installing the real clock on first use.
pub fn global() -> Arc<dyn TimeSource> {
    TIME_SOURCE
        .get_or_init(|| Arc::new(RealTimeSource))
        .clone()
}

/// Get the current time from the global time source
pub fn now() -> DateTime<Local> {
    TIME_SOURCE.get_or_init(|| Arc::new(RealTimeSource)).now()
}

/// Parse a datetime string in the format "YYYY-MM-DD HH:MM:SS"
pub fn parse_datetime(s: &str) -> Result<DateTime<Local>, String> {
    use chrono::NaiveDateTime;

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| format!("Invalid datetime format: {e}. Use YYYY-MM-DD HH:MM:SS"))
        .and_then(|naive| {
            Local
                .from_local_datetime(&naive)
                .single()
                .ok_or_else(|| "Ambiguous or invalid local time".to_string())
        })
}
