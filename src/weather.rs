//! Weather and geocoding gateway for the OpenWeatherMap API
//!
//! Current conditions and forecast payloads are passed through untouched.
//! Geocoding results are reduced to `{label, location}` suggestions.

use std::time::{Duration, Instant};

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::WeatherRecordError;
use crate::config::WeatherConfig;
use crate::location::ResolvedLocation;
use crate::models::LocationSuggestion;

/// Number of candidates requested from the geocoding API
pub const GEOCODING_LIMIT: u32 = 5;

const CURRENT_WEATHER_FALLBACK: &str = "Error fetching current weather";
const FORECAST_FALLBACK: &str = "Error fetching forecast";
const GEOCODING_FALLBACK: &str = "Error fetching location suggestions";

/// Raw payloads fetched for one location
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPayloads {
    pub current: Value,
    pub forecast: Value,
}

/// Weather API client for OpenWeatherMap
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    geo_base_url: String,
    units: String,
}

impl OpenWeatherClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig) -> crate::Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            "weather-records/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds.into()));
        }
        let client = builder.build().map_err(|e| {
            WeatherRecordError::config(format!("Failed to create HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            geo_base_url: config.geo_base_url.trim_end_matches('/').to_string(),
            units: config.units.clone(),
        })
    }

    /// Fetch current conditions, then the forecast. The forecast is only
    /// requested once the current conditions came back successfully.
    #[instrument(skip(self, api_key))]
    pub async fn fetch(
        &self,
        location: &ResolvedLocation,
        api_key: &str,
    ) -> crate::Result<WeatherPayloads> {
        let current = self
            .fetch_payload("weather", location, api_key, CURRENT_WEATHER_FALLBACK)
            .await?;
        let forecast = self
            .fetch_payload("forecast", location, api_key, FORECAST_FALLBACK)
            .await?;

        Ok(WeatherPayloads { current, forecast })
    }

    async fn fetch_payload(
        &self,
        endpoint: &str,
        location: &ResolvedLocation,
        api_key: &str,
        fallback: &str,
    ) -> crate::Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut query = location.query_params();
        query.push(("units", self.units.clone()));

        let start_time = Instant::now();
        let response = self.send(&url, &query, api_key).await?;
        let status = response.status();

        if status != StatusCode::OK {
            let message = upstream_message(response, fallback).await;
            warn!(%status, endpoint, "Weather provider rejected request: {}", message);
            return Err(WeatherRecordError::upstream(status.as_u16(), message));
        }

        let payload: Value = response.json().await.map_err(|e| {
            WeatherRecordError::upstream(
                StatusCode::BAD_GATEWAY.as_u16(),
                format!("{fallback}: invalid response body ({})", e.without_url()),
            )
        })?;

        info!(
            endpoint,
            "Retrieved weather payload in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(payload)
    }

    /// Look up to five candidate places for a free-text query
    #[instrument(skip(self, api_key))]
    pub async fn search(
        &self,
        query: &str,
        api_key: &str,
    ) -> crate::Result<Vec<LocationSuggestion>> {
        let url = format!("{}/direct", self.geo_base_url);
        let params = vec![
            ("q", query.to_string()),
            ("limit", GEOCODING_LIMIT.to_string()),
        ];

        let response = self.send(&url, &params, api_key).await?;
        let status = response.status();
        if status != StatusCode::OK {
            warn!(%status, "Geocoding provider rejected request");
            return Err(WeatherRecordError::upstream(
                status.as_u16(),
                GEOCODING_FALLBACK,
            ));
        }

        let results: Vec<GeocodingResult> = response.json().await.map_err(|e| {
            WeatherRecordError::upstream(
                StatusCode::BAD_GATEWAY.as_u16(),
                format!(
                    "{GEOCODING_FALLBACK}: invalid response body ({})",
                    e.without_url()
                ),
            )
        })?;

        if results.is_empty() {
            debug!("No geocoding results for '{}'", query);
        }

        Ok(results.iter().map(GeocodingResult::to_suggestion).collect())
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&'static str, String)],
        api_key: &str,
    ) -> crate::Result<Response> {
        debug!(url, ?params, "Sending provider request");
        self.client
            .get(url)
            .query(params)
            .query(&[("appid", api_key)])
            .send()
            .await
            .map_err(|e| {
                // reqwest errors include the URL, which carries the key
                let e = e.without_url();
                warn!("Provider request failed: {}", e);
                WeatherRecordError::upstream(
                    StatusCode::BAD_GATEWAY.as_u16(),
                    format!("Weather provider unreachable: {e}"),
                )
            })
    }
}

/// Pull the provider's `message` field out of an error body
async fn upstream_message(response: Response, fallback: &str) -> String {
    response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(message_text))
        .unwrap_or_else(|| fallback.to_string())
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Geocoding result from the OpenWeatherMap direct geocoding API
#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingResult {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl GeocodingResult {
    /// `"name, state, country"` without empty parts
    #[must_use]
    pub fn label(&self) -> String {
        [
            Some(self.name.as_str()),
            self.state.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    #[must_use]
    pub fn to_suggestion(&self) -> LocationSuggestion {
        LocationSuggestion {
            label: self.label(),
            location: format!("{},{}", self.lat, self.lon),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocoding(name: &str, state: Option<&str>, country: Option<&str>) -> GeocodingResult {
        GeocodingResult {
            name: name.to_string(),
            lat: 48.8566,
            lon: 2.3522,
            country: country.map(str::to_string),
            state: state.map(str::to_string),
        }
    }

    #[test]
    fn test_label_with_all_parts() {
        let result = geocoding("Paris", Some("Ile-de-France"), Some("FR"));
        assert_eq!(result.label(), "Paris, Ile-de-France, FR");
    }

    #[test]
    fn test_label_skips_missing_state() {
        assert_eq!(geocoding("Paris", None, Some("FR")).label(), "Paris, FR");
        assert_eq!(geocoding("Paris", Some(""), Some("FR")).label(), "Paris, FR");
    }

    #[test]
    fn test_label_strips_trailing_empty_parts() {
        assert_eq!(geocoding("Paris", Some("TX"), None).label(), "Paris, TX");
        assert_eq!(geocoding("Paris", None, None).label(), "Paris");
    }

    #[test]
    fn test_suggestion_location_round_trips_through_resolver() {
        let suggestion = geocoding("Paris", None, Some("FR")).to_suggestion();
        assert_eq!(suggestion.location, "48.8566,2.3522");

        let resolved = crate::location::LocationResolver::resolve(&suggestion.location).unwrap();
        assert_eq!(
            resolved,
            ResolvedLocation::Coordinates {
                lat: "48.8566".to_string(),
                lon: "2.3522".to_string()
            }
        );
    }

    #[test]
    fn test_geocoding_result_deserializes_without_state() {
        let result: GeocodingResult = serde_json::from_value(serde_json::json!({
            "name": "Paris",
            "lat": 48.8566,
            "lon": 2.3522,
            "country": "FR"
        }))
        .unwrap();
        assert!(result.state.is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let config = WeatherConfig {
            base_url: "http://localhost:1234/data/2.5/".to_string(),
            ..WeatherConfig::default()
        };
        let client = OpenWeatherClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/data/2.5");
    }
}
