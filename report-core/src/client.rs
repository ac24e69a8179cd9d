use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;

pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A coordinate pair resolved from the city directory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One day of min/max 2-meter temperatures.
///
/// Both series are index-aligned and guaranteed equal length ≥ 1; a payload
/// that violates this is rejected at construction and no forecast exists.
/// Replaced wholesale on each fetch, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl DailyForecast {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Result<Self, ClientError> {
        if min.is_empty() {
            return Err(ClientError::Payload(
                "temperature series are empty".to_string(),
            ));
        }
        if min.len() != max.len() {
            return Err(ClientError::Payload(format!(
                "temperature series lengths differ: {} min vs {} max",
                min.len(),
                max.len(),
            )));
        }

        Ok(Self { min, max })
    }

    pub fn min_temperatures(&self) -> &[f64] {
        &self.min
    }

    pub fn max_temperatures(&self) -> &[f64] {
        &self.max
    }

    /// Mean of the first day's min and max, rounded to 2 decimal places.
    /// Derived on demand from the immutable series, never stored.
    pub fn average_temperature(&self) -> f64 {
        let avg = (self.min[0] + self.max[0]) / 2.0;
        (avg * 100.0).round() / 100.0
    }
}

/// Seam between the fetch pipeline and the remote forecast service, so
/// tests can substitute a fake without touching the network.
#[async_trait]
pub trait ForecastClient: Send + Sync + Debug {
    async fn fetch(&self, coords: Coordinates) -> Result<DailyForecast, ClientError>;
}

/// Client for `GET {base}/v1/forecast` on api.open-meteo.com.
///
/// One outbound call per invocation, no retries, no caching.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    http: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_base_url(OPEN_METEO_BASE_URL)
    }

    /// Point the client at a different host (mock server under test).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    temperature_2m_min: Vec<f64>,
    temperature_2m_max: Vec<f64>,
}

#[async_trait]
impl ForecastClient for OpenMeteoClient {
    async fn fetch(&self, coords: Coordinates) -> Result<DailyForecast, ClientError> {
        let url = format!("{}/v1/forecast", self.base_url);
        debug!(latitude = coords.latitude, longitude = coords.longitude, "forecast request");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("daily", "temperature_2m_min,temperature_2m_max".to_string()),
                ("forecast_days", "1".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: ForecastResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Payload(e.to_string()))?;

        DailyForecast::new(
            parsed.daily.temperature_2m_min,
            parsed.daily.temperature_2m_max,
        )
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Back off to a char boundary so the slice cannot split a
    // multi-byte character.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn london() -> Coordinates {
        Coordinates {
            latitude: 51.5,
            longitude: -0.12,
        }
    }

    #[test]
    fn forecast_rejects_empty_series() {
        let err = DailyForecast::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, ClientError::Payload(_)));
    }

    #[test]
    fn forecast_rejects_mismatched_series() {
        let err = DailyForecast::new(vec![10.0], vec![18.0, 19.0]).unwrap_err();
        assert!(matches!(err, ClientError::Payload(_)));
    }

    #[test]
    fn average_temperature_rounds_to_two_decimals() {
        let forecast = DailyForecast::new(vec![10.0], vec![18.0]).unwrap();
        assert_eq!(forecast.average_temperature(), 14.0);

        let forecast = DailyForecast::new(vec![10.123], vec![18.2]).unwrap();
        assert_eq!(forecast.average_temperature(), 14.16);
    }

    #[tokio::test]
    async fn fetch_parses_a_successful_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "51.5"))
            .and(query_param("longitude", "-0.12"))
            .and(query_param("daily", "temperature_2m_min,temperature_2m_max"))
            .and(query_param("forecast_days", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "time": ["2026-08-30"],
                    "temperature_2m_min": [10.0],
                    "temperature_2m_max": [18.0]
                }
            })))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::with_base_url(server.uri()).unwrap();
        let forecast = client.fetch(london()).await.unwrap();

        assert_eq!(forecast.min_temperatures(), &[10.0]);
        assert_eq!(forecast.max_temperatures(), &[18.0]);
        assert_eq!(forecast.average_temperature(), 14.0);
    }

    #[tokio::test]
    async fn fetch_fails_on_non_success_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::with_base_url(server.uri()).unwrap();
        let err = client.fetch(london()).await.unwrap_err();

        assert!(matches!(err, ClientError::Status { .. }));
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn truncate_body_never_splits_a_multibyte_char() {
        let body = format!("{}€", "a".repeat(199));
        assert_eq!(body.len(), 202);

        let truncated = truncate_body(&body);
        assert_eq!(truncated, format!("{}...", "a".repeat(199)));
    }

    #[tokio::test]
    async fn fetch_surfaces_non_success_with_multibyte_body() {
        let server = MockServer::start().await;

        // The 200th byte falls inside the euro sign.
        let body = format!("{}€", "a".repeat(199));
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500).set_body_string(body))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::with_base_url(server.uri()).unwrap();
        let err = client.fetch(london()).await.unwrap_err();

        assert!(matches!(err, ClientError::Status { .. }));
    }

    #[tokio::test]
    async fn fetch_fails_on_malformed_payload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": { "temperature_2m_min": [10.0] }
            })))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::with_base_url(server.uri()).unwrap();
        let err = client.fetch(london()).await.unwrap_err();

        assert!(matches!(err, ClientError::Payload(_)));
    }

    #[tokio::test]
    async fn fetch_fails_on_mismatched_series_lengths() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "daily": {
                    "temperature_2m_min": [10.0, 9.0],
                    "temperature_2m_max": [18.0]
                }
            })))
            .mount(&server)
            .await;

        let client = OpenMeteoClient::with_base_url(server.uri()).unwrap();
        let err = client.fetch(london()).await.unwrap_err();

        assert!(matches!(err, ClientError::Payload(_)));
    }
}
