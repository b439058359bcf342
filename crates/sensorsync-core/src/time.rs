//! Timestamps and time intervals used to sample properties

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Instant at which properties are sampled
pub type JulianDate = DateTime<Utc>;

/// Seconds elapsed from `start` to `end` (negative when `end` is earlier)
pub fn seconds_between(start: &JulianDate, end: &JulianDate) -> f64 {
    let delta = *end - *start;
    match delta.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Offset a date by a (possibly fractional) number of seconds
///
/// Returns `None` when `seconds` is not finite or the result leaves the
/// representable range.
pub fn add_seconds(time: &JulianDate, seconds: f64) -> Option<JulianDate> {
    let nanos = (seconds * 1e9).round();
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    time.checked_add_signed(Duration::nanoseconds(nanos as i64))
}

/// A span of time, optionally open at either end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: JulianDate,
    pub stop: JulianDate,
    #[serde(default = "default_true")]
    pub is_start_included: bool,
    #[serde(default = "default_true")]
    pub is_stop_included: bool,
}

fn default_true() -> bool {
    true
}

impl TimeInterval {
    /// Closed interval `[start, stop]`
    pub fn new(start: JulianDate, stop: JulianDate) -> Self {
        Self {
            start,
            stop,
            is_start_included: true,
            is_stop_included: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.start.cmp(&self.stop) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Equal => !(self.is_start_included && self.is_stop_included),
            std::cmp::Ordering::Less => false,
        }
    }

    /// Check whether `time` falls inside this interval
    pub fn contains(&self, time: &JulianDate) -> bool {
        if self.is_empty() {
            return false;
        }
        let after_start = if self.is_start_included {
            *time >= self.start
        } else {
            *time > self.start
        };
        let before_stop = if self.is_stop_included {
            *time <= self.stop
        } else {
            *time < self.stop
        };
        after_start && before_stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> JulianDate {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_seconds_between() {
        assert_eq!(seconds_between(&at(0), &at(90)), 90.0);
        assert_eq!(seconds_between(&at(90), &at(0)), -90.0);
        assert_eq!(seconds_between(&at(0), &add_seconds(&at(0), 0.25).unwrap()), 0.25);
    }

    #[test]
    fn test_add_seconds_out_of_range() {
        assert_eq!(add_seconds(&at(0), -1.5), Some(at(0) - Duration::milliseconds(1500)));
        assert_eq!(add_seconds(&at(0), f64::NAN), None);
        assert_eq!(add_seconds(&at(0), f64::INFINITY), None);
        // Past the i64 nanosecond range (about 292 years)
        assert_eq!(add_seconds(&at(0), 1e10), None);
        // Within range of the offset but beyond the last representable date
        assert_eq!(add_seconds(&JulianDate::MAX_UTC, 1.0), None);
    }

    #[test]
    fn test_interval_contains() {
        let interval = TimeInterval::new(at(0), at(10));
        assert!(interval.contains(&at(0)));
        assert!(interval.contains(&at(5)));
        assert!(interval.contains(&at(10)));
        assert!(!interval.contains(&at(11)));

        let open = TimeInterval {
            is_start_included: false,
            is_stop_included: false,
            ..interval
        };
        assert!(!open.contains(&at(0)));
        assert!(!open.contains(&at(10)));
        assert!(open.contains(&at(1)));
    }

    #[test]
    fn test_empty_interval() {
        assert!(TimeInterval::new(at(10), at(0)).is_empty());
        assert!(!TimeInterval::new(at(3), at(3)).is_empty());
        let half_open = TimeInterval {
            is_stop_included: false,
            ..TimeInterval::new(at(3), at(3))
        };
        assert!(half_open.is_empty());
        assert!(!half_open.contains(&at(3)));
    }
}
