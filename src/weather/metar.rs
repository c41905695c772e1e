//! METAR XML parser for the aviationweather.gov data server format

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ObservationParser, ParseOutcome, SkippedStation};
use crate::error::MetarMapError;
use crate::models::observation::normalize_station_id;
use crate::models::{FlightCategory, Observation, WeatherDetails};

/// Data server XML structure for deserialization
#[derive(Debug, Deserialize)]
struct MetarResponse {
    #[serde(default)]
    errors: Option<FeedMessages>,
    #[serde(default)]
    data: Option<MetarData>,
}

#[derive(Debug, Deserialize)]
struct FeedMessages {
    #[serde(rename = "error", default)]
    messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MetarData {
    #[serde(rename = "METAR", default)]
    metars: Vec<MetarRecord>,
}

/// Everything is read as text and converted afterwards so one bad field
/// only costs its own station.
#[derive(Debug, Default, Deserialize)]
struct MetarRecord {
    station_id: Option<String>,
    raw_text: Option<String>,
    observation_time: Option<String>,
    flight_category: Option<String>,
    wind_dir_degrees: Option<String>,
    wind_speed_kt: Option<String>,
    wind_gust_kt: Option<String>,
    visibility_statute_mi: Option<String>,
    temp_c: Option<String>,
    dewpoint_c: Option<String>,
    altim_in_hg: Option<String>,
    wx_string: Option<String>,
}

fn text(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// Thunderstorm or lightning reported, and not "thunderstorm sensor not available".
/// Matches whole report groups, so station ids like `KTSP` do not count.
#[must_use]
pub fn detect_lightning(raw_text: &str) -> bool {
    let groups: Vec<&str> = raw_text.split_whitespace().collect();
    if groups.contains(&"TSNO") {
        return false;
    }
    // the first group is the station, or METAR/SPECI
    groups.iter().skip(1).any(|group| {
        let weather = group.trim_start_matches(['+', '-']);
        let weather = weather.strip_prefix("VC").unwrap_or(weather);
        weather.starts_with("TS") || group.starts_with("LTG")
    })
}

fn parse_knots(field: &str, value: Option<&String>) -> std::result::Result<u32, String> {
    match text(value) {
        None => Ok(0),
        Some(v) => v
            .parse::<u32>()
            .map_err(|_| format!("invalid {field} '{v}'")),
    }
}

fn parse_rounded(value: Option<&String>) -> Option<i32> {
    text(value)
        .map(|v| v.replace('+', ""))
        .and_then(|v| v.parse::<f64>().ok())
        .map(|v| v.round() as i32)
}

impl MetarRecord {
    fn into_observation(self, fetched_at: DateTime<Utc>) -> std::result::Result<Observation, SkippedStation> {
        let Some(station_id) = text(self.station_id.as_ref()).map(normalize_station_id) else {
            return Err(SkippedStation {
                station_id: None,
                reason: "missing station id".to_string(),
            });
        };
        let skip = |reason: String| SkippedStation {
            station_id: Some(station_id.clone()),
            reason,
        };

        let wind_speed_kt = parse_knots("wind speed", self.wind_speed_kt.as_ref()).map_err(skip)?;
        let wind_gust_kt = parse_knots("wind gust", self.wind_gust_kt.as_ref()).map_err(skip)?;

        let observed_at = text(self.observation_time.as_ref())
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map_or(fetched_at, |t| t.with_timezone(&Utc));

        let raw_text = text(self.raw_text.as_ref()).map(str::to_string);
        let has_lightning = raw_text.as_deref().is_some_and(detect_lightning);

        let details = WeatherDetails {
            wind_dir: text(self.wind_dir_degrees.as_ref()).map(str::to_string),
            visibility_sm: parse_rounded(self.visibility_statute_mi.as_ref()),
            temp_c: parse_rounded(self.temp_c.as_ref()),
            dewpoint_c: parse_rounded(self.dewpoint_c.as_ref()),
            altim_in_hg: text(self.altim_in_hg.as_ref())
                .and_then(|v| v.parse::<f64>().ok())
                .map(|v| (v * 100.0).round() / 100.0),
            wx_string: text(self.wx_string.as_ref()).map(str::to_string),
            raw_text,
        };

        Ok(Observation {
            station_id,
            flight_category: FlightCategory::from_feed(text(self.flight_category.as_ref())),
            wind_speed_kt,
            wind_gust_kt,
            has_lightning,
            observed_at,
            details,
        })
    }
}

/// Parser for `format=xml` data server responses
#[derive(Debug, Clone, Copy, Default)]
pub struct MetarXmlParser;

impl ObservationParser for MetarXmlParser {
    fn parse(&self, raw: &[u8], fetched_at: DateTime<Utc>) -> crate::Result<ParseOutcome> {
        let xml = std::str::from_utf8(raw)
            .map_err(|e| MetarMapError::parse(format!("Feed is not valid UTF-8: {e}")))?;
        let response: MetarResponse = from_str(xml)
            .map_err(|e| MetarMapError::parse(format!("Failed to parse METAR XML: {e}")))?;

        if let Some(errors) = response.errors {
            let messages: Vec<_> = errors
                .messages
                .iter()
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .collect();
            if !messages.is_empty() {
                return Err(MetarMapError::parse(format!(
                    "Weather feed reported errors: {}",
                    messages.join("; ")
                )));
            }
        }

        let mut outcome = ParseOutcome::default();
        let records = response.data.map(|d| d.metars).unwrap_or_default();
        for record in records {
            match record.into_observation(fetched_at) {
                Ok(obs) => {
                    if outcome.observations.iter().any(|o| o.station_id == obs.station_id) {
                        outcome.skipped.push(SkippedStation {
                            station_id: Some(obs.station_id),
                            reason: "duplicate report".to_string(),
                        });
                        continue;
                    }
                    debug!("{}", obs.summary());
                    outcome.observations.push(obs);
                }
                Err(skipped) => {
                    warn!(
                        station = skipped.station_id.as_deref().unwrap_or("?"),
                        "Skipping METAR: {}", skipped.reason
                    );
                    outcome.skipped.push(skipped);
                }
            }
        }

        Ok(outcome)
    }
}
