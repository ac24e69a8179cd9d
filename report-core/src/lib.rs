//! Core library for the `weather-report` app.
//!
//! This crate defines:
//! - The bundled city directory (name → coordinates)
//! - The Open-Meteo forecast client
//! - Selection state with write-through persistence
//! - The periodic refresh controller
//! - The report model tying fetch state together for rendering
//!
//! It is used by `report-cli`, but can also be reused by other binaries or services.

pub mod cities;
pub mod client;
pub mod error;
pub mod refresh;
pub mod report;
pub mod selection;

pub use cities::{City, CityDirectory};
pub use client::{Coordinates, DailyForecast, ForecastClient, OpenMeteoClient};
pub use error::{ClientError, FetchError};
pub use refresh::{DEFAULT_REFRESH_INTERVAL, RefreshController, RefreshState};
pub use report::{ReportModel, RequestState};
pub use selection::{FileStore, KvStore, MemoryStore, SELECTED_CITY_KEY, Selection};
