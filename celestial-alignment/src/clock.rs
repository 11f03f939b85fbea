use std::time::{SystemTime, UNIX_EPOCH};

pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Source of the current time as a Julian date (UTC, treated as UT1).
pub trait JulianClock: Send + Sync {
    fn julian_date(&self) -> f64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JulianClock for SystemClock {
    fn julian_date(&self) -> f64 {
        // A clock set before 1970 is reported as the epoch itself.
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        UNIX_EPOCH_JD + secs / SECONDS_PER_DAY
    }
}

/// Clock frozen at a given Julian date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f64);

impl JulianClock for FixedClock {
    fn julian_date(&self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_its_date() {
        assert_eq!(FixedClock(2451545.0).julian_date(), 2451545.0);
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00Z
        assert!(SystemClock.julian_date() > 2_458_849.5);
    }
}
