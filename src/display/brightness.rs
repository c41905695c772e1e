//! Day/night strip brightness
//!
//! The strip runs at full brightness between the bright and dim start times
//! and dimmed otherwise. The window comes from local sunrise and sunset when a
//! location is configured, else from fixed clock times.

use chrono::{DateTime, NaiveTime, TimeZone};
use tracing::warn;

use crate::weather::sun_times;

#[derive(Debug, Clone, PartialEq)]
pub struct BrightnessSchedule {
    pub enabled: bool,
    pub bright: f32,
    pub dim: f32,
    pub bright_start: NaiveTime,
    pub dim_start: NaiveTime,
    /// `(latitude, longitude)` for sunrise/sunset; `None` keeps the fixed times
    pub location: Option<(f64, f64)>,
}

impl BrightnessSchedule {
    /// Always full brightness
    #[must_use]
    pub fn constant(brightness: f32) -> Self {
        Self {
            enabled: false,
            bright: brightness,
            dim: brightness,
            bright_start: NaiveTime::MIN,
            dim_start: NaiveTime::MIN,
            location: None,
        }
    }

    /// Bright window for the day of `now`, as local times of day
    pub fn window<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> (NaiveTime, NaiveTime) {
        let fixed = (self.bright_start, self.dim_start);
        let Some((latitude, longitude)) = self.location else {
            return fixed;
        };

        match sun_times(latitude, longitude, now.date_naive()) {
            Ok(Some((sunrise, sunset))) => (
                sunrise.with_timezone(&now.timezone()).time(),
                sunset.with_timezone(&now.timezone()).time(),
            ),
            Ok(None) => fixed,
            Err(e) => {
                warn!("Sunrise/sunset unavailable, using fixed times: {e:#}");
                fixed
            }
        }
    }

    /// Brightness to apply at `now`
    pub fn brightness_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> f32 {
        if !self.enabled {
            return self.bright;
        }
        let (bright_start, dim_start) = self.window(now);
        let time = now.time();
        if bright_start < time && time < dim_start {
            self.bright
        } else {
            self.dim
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike, Utc};
    use rstest::rstest;

    fn fixed_schedule() -> BrightnessSchedule {
        BrightnessSchedule {
            enabled: true,
            bright: 0.5,
            dim: 0.1,
            bright_start: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            dim_start: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            location: None,
        }
    }

    #[rstest]
    #[case(12, 0, 0.5)]
    #[case(7, 30, 0.5)]
    #[case(7, 0, 0.1)]
    #[case(19, 0, 0.1)]
    #[case(23, 15, 0.1)]
    #[case(3, 0, 0.1)]
    fn test_fixed_window(#[case] hour: u32, #[case] minute: u32, #[case] expected: f32) {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, hour, minute, 0).unwrap();
        assert_eq!(fixed_schedule().brightness_at(&now), expected);
    }

    #[test]
    fn test_disabled_is_always_bright() {
        let schedule = BrightnessSchedule {
            enabled: false,
            ..fixed_schedule()
        };
        let midnight = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(schedule.brightness_at(&midnight), 0.5);
        assert_eq!(BrightnessSchedule::constant(0.3).brightness_at(&midnight), 0.3);
    }

    #[test]
    fn test_sun_window_in_local_time() {
        // Little Rock, central daylight time
        let schedule = BrightnessSchedule {
            location: Some((34.7465, -92.2896)),
            ..fixed_schedule()
        };
        let cdt = FixedOffset::west_opt(5 * 3600).unwrap();
        let noon = cdt.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        let (sunrise, sunset) = schedule.window(&noon);
        assert!((5..7).contains(&sunrise.hour()));
        assert!((19..21).contains(&sunset.hour()));
        assert_eq!(schedule.brightness_at(&noon), 0.5);

        let late = cdt.with_ymd_and_hms(2024, 6, 21, 23, 0, 0).unwrap();
        assert_eq!(schedule.brightness_at(&late), 0.1);
    }

    #[test]
    fn test_midnight_sun_uses_fixed_times() {
        // Svalbard, sun never sets around the June solstice
        let schedule = BrightnessSchedule {
            location: Some((78.2232, 15.6267)),
            ..fixed_schedule()
        };
        let noon = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        assert_eq!(
            schedule.window(&noon),
            (schedule.bright_start, schedule.dim_start)
        );
        let night = Utc.with_ymd_and_hms(2024, 6, 21, 23, 0, 0).unwrap();
        assert_eq!(schedule.brightness_at(&night), 0.1);
    }
}
