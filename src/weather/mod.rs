//! Weather feed collaborators
//!
//! The scheduler only talks to the [`Fetcher`] and [`ObservationParser`]
//! traits; the aviationweather.gov client and the METAR XML parser are the
//! production implementations.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use std::future::Future;
use sunrise::{Coordinates, SolarDay, SolarEvent};

use crate::models::Observation;

pub mod aviation_weather;
pub mod metar;

pub use aviation_weather::AviationWeatherClient;
pub use metar::MetarXmlParser;

/// Retrieves the raw feed document for a set of stations
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, stations: &[String]) -> impl Future<Output = crate::Result<Vec<u8>>> + Send;
}

/// Decodes a raw feed document into observations
pub trait ObservationParser: Send + Sync + 'static {
    /// `fetched_at` stands in for stations that omit their observation time
    fn parse(&self, raw: &[u8], fetched_at: DateTime<Utc>) -> crate::Result<ParseOutcome>;
}

/// A station record dropped during parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStation {
    pub station_id: Option<String>,
    pub reason: String,
}

/// Parsed observations plus the records that could not be used
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedStation>,
}

/// Sunrise and sunset for a location and date, `None` when the sun does not both rise and set
pub fn sun_times(
    latitude: f64,
    longitude: f64,
    date: NaiveDate,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let coordinates = Coordinates::new(latitude, longitude)
        .with_context(|| format!("Invalid coordinates: lat={latitude}, lng={longitude}"))?;

    let solar_day = SolarDay::new(coordinates, date);

    let sunrise = solar_day.event_time(SolarEvent::Sunrise);
    let sunset = solar_day.event_time(SolarEvent::Sunset);

    Ok(match (sunrise, sunset) {
        (Some(sunrise), Some(sunset)) if sunrise < sunset => Some((sunrise, sunset)),
        _ => None,
    })
}
