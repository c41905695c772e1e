//! Normalized METAR observation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Ceiling-and-visibility flight rule category reported for a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightCategory {
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
    /// Feed omitted the category or sent something unrecognized
    Unknown,
}

impl FlightCategory {
    /// Parse a feed value, falling back to `Unknown` for anything unrecognized
    #[must_use]
    pub fn from_feed(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(FlightCategory::Unknown)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FlightCategory::Vfr => "VFR",
            FlightCategory::Mvfr => "MVFR",
            FlightCategory::Ifr => "IFR",
            FlightCategory::Lifr => "LIFR",
            FlightCategory::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for FlightCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VFR" => Ok(FlightCategory::Vfr),
            "MVFR" => Ok(FlightCategory::Mvfr),
            "IFR" => Ok(FlightCategory::Ifr),
            "LIFR" => Ok(FlightCategory::Lifr),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-only details carried from the feed. Never used for classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherDetails {
    /// Wind direction in degrees, or `VRB`
    pub wind_dir: Option<String>,
    /// Visibility in statute miles, rounded
    pub visibility_sm: Option<i32>,
    pub temp_c: Option<i32>,
    pub dewpoint_c: Option<i32>,
    /// Altimeter setting in inches of mercury
    pub altim_in_hg: Option<f64>,
    /// Present weather, e.g. `-TSRA BR`
    pub wx_string: Option<String>,
    pub raw_text: Option<String>,
}

/// One airport's latest weather snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// ICAO station identifier, upper case
    pub station_id: String,
    pub flight_category: FlightCategory,
    /// Sustained wind in knots, 0 if not reported
    pub wind_speed_kt: u32,
    /// Gust speed in knots, 0 if not reported
    pub wind_gust_kt: u32,
    pub has_lightning: bool,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub details: WeatherDetails,
}

impl Observation {
    /// Create an observation with no supplementary details
    pub fn new<S: Into<String>>(
        station_id: S,
        flight_category: FlightCategory,
        wind_speed_kt: u32,
        wind_gust_kt: u32,
        has_lightning: bool,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            station_id: normalize_station_id(&station_id.into()),
            flight_category,
            wind_speed_kt,
            wind_gust_kt,
            has_lightning,
            observed_at,
            details: WeatherDetails::default(),
        }
    }

    /// One-line summary in the familiar `KXYZ:VFR:270@12G20:10SM:...` shape
    #[must_use]
    pub fn summary(&self) -> String {
        let gust = if self.wind_gust_kt > 0 {
            format!("G{}", self.wind_gust_kt)
        } else {
            String::new()
        };
        let d = &self.details;
        format!(
            "{}:{}:{}@{}{}:{}SM:{}:{}/{}:{}:{}",
            self.station_id,
            self.flight_category,
            d.wind_dir.as_deref().unwrap_or(""),
            self.wind_speed_kt,
            gust,
            d.visibility_sm.unwrap_or(0),
            d.wx_string.as_deref().unwrap_or(""),
            d.temp_c.unwrap_or(0),
            d.dewpoint_c.unwrap_or(0),
            d.altim_in_hg.unwrap_or(0.0),
            self.has_lightning
        )
    }
}

/// Station ids are compared upper case with surrounding whitespace removed
#[must_use]
pub fn normalize_station_id(id: &str) -> String {
    id.trim().to_ascii_uppercase()
}

/// All observations of one successful fetch cycle, keyed by station
#[derive(Debug, Clone, Default)]
pub struct ObservationSet {
    observations: HashMap<String, Observation>,
    fetched_at: Option<DateTime<Utc>>,
}

impl ObservationSet {
    /// Build a set from parsed observations. The first entry for a station wins.
    pub fn new(observations: impl IntoIterator<Item = Observation>, fetched_at: DateTime<Utc>) -> Self {
        let mut map = HashMap::new();
        for obs in observations {
            map.entry(normalize_station_id(&obs.station_id)).or_insert(obs);
        }
        Self {
            observations: map,
            fetched_at: Some(fetched_at),
        }
    }

    /// Set used before the first successful fetch
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, station_id: &str) -> Option<&Observation> {
        self.observations.get(&normalize_station_id(station_id))
    }

    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("VFR"), FlightCategory::Vfr)]
    #[case(Some("MVFR"), FlightCategory::Mvfr)]
    #[case(Some("IFR"), FlightCategory::Ifr)]
    #[case(Some("LIFR"), FlightCategory::Lifr)]
    #[case(Some(" vfr "), FlightCategory::Vfr)]
    #[case(Some("SVFR"), FlightCategory::Unknown)]
    #[case(Some(""), FlightCategory::Unknown)]
    #[case(None, FlightCategory::Unknown)]
    fn test_flight_category_from_feed(
        #[case] value: Option<&str>,
        #[case] expected: FlightCategory,
    ) {
        assert_eq!(FlightCategory::from_feed(value), expected);
    }

    #[test]
    fn test_station_lookup_is_case_insensitive() {
        let obs = Observation::new("klit", FlightCategory::Vfr, 5, 0, false, Utc::now());
        let set = ObservationSet::new(vec![obs], Utc::now());
        assert!(set.get("KLIT").is_some());
        assert!(set.get(" klit").is_some());
        assert!(set.get("KXNA").is_none());
    }

    #[test]
    fn test_first_observation_wins() {
        let now = Utc::now();
        let set = ObservationSet::new(
            vec![
                Observation::new("KLIT", FlightCategory::Ifr, 5, 0, false, now),
                Observation::new("KLIT", FlightCategory::Vfr, 5, 0, false, now),
            ],
            now,
        );
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("KLIT").map(|o| o.flight_category), Some(FlightCategory::Ifr));
    }

    #[test]
    fn test_summary_includes_gust_only_when_reported() {
        let now = Utc::now();
        let mut obs = Observation::new("KLIT", FlightCategory::Mvfr, 12, 20, false, now);
        obs.details.wind_dir = Some("270".to_string());
        assert!(obs.summary().starts_with("KLIT:MVFR:270@12G20:"));

        obs.wind_gust_kt = 0;
        assert!(obs.summary().starts_with("KLIT:MVFR:270@12:"));
    }
}
