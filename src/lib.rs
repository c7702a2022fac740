//! Weather records - save, list, update, delete and export weather lookups
//!
//! A record ties a user supplied location and date range to the current
//! conditions and forecast fetched from OpenWeatherMap when it was created.

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod location;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::AppConfig;
pub use error::WeatherRecordError;
pub use location::{LocationResolver, ResolvedLocation};
pub use models::{DateRange, LocationSuggestion, NewWeatherRecord, WeatherRecord, WeatherRequest};
pub use service::WeatherRecordService;
pub use store::{FjallRecordStore, RecordStore};
pub use weather::{OpenWeatherClient, WeatherPayloads};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherRecordError>;
