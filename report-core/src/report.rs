use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cities::CityDirectory;
use crate::client::{Coordinates, DailyForecast, ForecastClient};
use crate::error::FetchError;

/// Snapshot of the fetch pipeline's state, as rendered by the UI.
///
/// After a completed fetch exactly one of `forecast` and `error` is
/// populated; both are absent before the first fetch and while a fetch is
/// in flight.
#[derive(Debug, Clone, Default)]
pub struct RequestState {
    pub selected_city: String,
    pub forecast: Option<DailyForecast>,
    pub error: Option<String>,
    pub is_loading: bool,
    /// When the last fetch completed, for staleness display.
    pub updated_at: Option<DateTime<Utc>>,
}

impl RequestState {
    /// Derived average for the first forecast day, absent without a forecast.
    pub fn average_temperature(&self) -> Option<f64> {
        self.forecast.as_ref().map(DailyForecast::average_temperature)
    }
}

/// Owns `RequestState` and runs the fetch pipeline.
///
/// Both the user-triggered Search and the refresh timer go through the one
/// `fetch_for` entry point, so loading and error semantics are identical
/// regardless of trigger source. Overlapping runs are serialized by a
/// monotonic request token: only the completion of the latest issued run is
/// allowed to write, stale completions are dropped.
#[derive(Debug)]
pub struct ReportModel {
    directory: CityDirectory,
    client: Arc<dyn ForecastClient>,
    state: Mutex<RequestState>,
    latest_token: AtomicU64,
}

impl ReportModel {
    pub fn new(directory: CityDirectory, client: Arc<dyn ForecastClient>) -> Self {
        Self {
            directory,
            client,
            state: Mutex::new(RequestState::default()),
            latest_token: AtomicU64::new(0),
        }
    }

    pub fn directory(&self) -> &CityDirectory {
        &self.directory
    }

    /// Run the pipeline for `city_name`: resolve, fetch, publish the result.
    ///
    /// Never fails outward; every failure is converted into the `error`
    /// field and `is_loading` always settles back to false.
    pub async fn fetch_for(&self, city_name: &str) {
        let token = self.latest_token.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin(city_name);

        let Some(city) = self.directory.resolve(city_name) else {
            // No network call for unknown cities.
            self.complete(token, Err(FetchError::CityNotFound));
            return;
        };

        let coords = Coordinates {
            latitude: city.latitude,
            longitude: city.longitude,
        };

        let outcome = self
            .client
            .fetch(coords)
            .await
            .map_err(FetchError::Network);

        self.complete(token, outcome);
    }

    pub fn snapshot(&self) -> RequestState {
        self.state.lock().clone()
    }

    fn begin(&self, city_name: &str) {
        let mut state = self.state.lock();
        state.selected_city = city_name.to_string();
        state.is_loading = true;
        state.forecast = None;
        state.error = None;
    }

    fn complete(&self, token: u64, outcome: Result<DailyForecast, FetchError>) {
        if token != self.latest_token.load(Ordering::SeqCst) {
            // A newer run was issued while this one was in flight; its
            // `begin` already owns the loading flag.
            debug!(token, "discarding stale fetch completion");
            return;
        }

        let mut state = self.state.lock();
        match outcome {
            Ok(forecast) => {
                state.forecast = Some(forecast);
                state.error = None;
            }
            Err(err) => {
                if let FetchError::Network(source) = &err {
                    warn!(city = %state.selected_city, %source, "forecast fetch failed");
                }
                state.error = Some(err.to_string());
                state.forecast = None;
            }
        }
        state.is_loading = false;
        state.updated_at = Some(Utc::now());
    }
}
