use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::Fetcher;
use crate::config::FeedConfig;
use crate::error::MetarMapError;

/// aviationweather.gov METAR data server client
pub struct AviationWeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    hours_before_now: u32,
}

impl AviationWeatherClient {
    /// Create a client with request timeout and transient-error retries from the feed config
    pub fn new(config: &FeedConfig) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MetarMapError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            hours_before_now: config.hours_before_now,
        })
    }

    /// Most recent METAR per station within the look-back window, as XML
    #[must_use]
    pub fn request_url(&self, stations: &[String]) -> String {
        format!(
            "{}?requestType=retrieve&dataSource=metars&stationString={}&hoursBeforeNow={}&format=xml&mostRecent=true&mostRecentForEachStation=constraint",
            self.base_url,
            urlencoding::encode(&stations.join(",")),
            self.hours_before_now
        )
    }
}

impl Fetcher for AviationWeatherClient {
    #[instrument(name = "fetch_metars", skip_all, fields(stations = stations.len()))]
    async fn fetch(&self, stations: &[String]) -> crate::Result<Vec<u8>> {
        if stations.is_empty() {
            return Err(MetarMapError::fetch("No stations to request"));
        }

        let url = self.request_url(stations);
        info!("Fetching METAR data from {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetarMapError::fetch(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetarMapError::fetch(format!("Weather feed returned {status}: {body}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MetarMapError::fetch(format!("Failed to read response body: {e}")))?;
        debug!(bytes = bytes.len(), "Received METAR document");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_lists_stations() {
        let client = AviationWeatherClient::new(&FeedConfig::default()).unwrap();
        let url = client.request_url(&["KLIT".to_string(), "KXNA".to_string()]);
        assert!(url.starts_with("https://aviationweather.gov/cgi-bin/data/dataserver.php?"));
        assert!(url.contains("stationString=KLIT%2CKXNA"));
        assert!(url.contains("hoursBeforeNow=5"));
        assert!(url.contains("mostRecentForEachStation=constraint"));
    }

    #[tokio::test]
    async fn test_empty_station_list_is_a_fetch_error() {
        let client = AviationWeatherClient::new(&FeedConfig::default()).unwrap();
        let err = client.fetch(&[]).await.unwrap_err();
        assert!(matches!(err, MetarMapError::Fetch { .. }));
    }
}
