//! Request, record and response types
//!
//! `WeatherRecord` is both the stored document and the wire shape, so every
//! list the API hands out (including exports) has the same key set and order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::WeatherRecordError;

/// Inclusive calendar date range of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Reject ranges that end before they start
    pub fn validate(&self) -> crate::Result<()> {
        if self.start > self.end {
            return Err(WeatherRecordError::validation(
                "Start date cannot be after end date.",
            ));
        }
        Ok(())
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherRequest {
    pub location: String,
    pub date_range: DateRange,
}

/// A persisted weather lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: String,
    /// Location exactly as the user entered it
    pub location: String,
    pub date_range: DateRange,
    /// Current conditions payload, stored verbatim
    pub weather_data: Value,
    /// Forecast payload, stored verbatim
    pub forecast_data: Value,
    #[serde(default)]
    pub youtube_videos: Vec<String>,
    #[serde(default)]
    pub google_map_url: String,
}

/// A record that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewWeatherRecord {
    pub location: String,
    pub date_range: DateRange,
    pub weather_data: Value,
    pub forecast_data: Value,
    pub youtube_videos: Vec<String>,
    pub google_map_url: String,
}

impl NewWeatherRecord {
    #[must_use]
    pub fn with_id(self, id: String) -> WeatherRecord {
        WeatherRecord {
            id,
            location: self.location,
            date_range: self.date_range,
            weather_data: self.weather_data,
            forecast_data: self.forecast_data,
            youtube_videos: self.youtube_videos,
            google_map_url: self.google_map_url,
        }
    }
}

/// One candidate place returned by the location search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    /// Human readable "name, state, country"
    pub label: String,
    /// "lat,lon", accepted as a location on create
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}
