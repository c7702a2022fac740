//! Record workflows, independent of the HTTP layer
//!
//! Create validates input, fetches both weather payloads, and only then
//! persists, so a failed upstream call never leaves a partial record.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{AppConfig, MapsConfig};
use crate::location::LocationResolver;
use crate::models::{LocationSuggestion, NewWeatherRecord, WeatherRecord, WeatherRequest};
use crate::store::RecordStore;
use crate::weather::OpenWeatherClient;
use crate::{WeatherRecordError, export};

/// Shared handles every operation needs
#[derive(Clone)]
pub struct WeatherRecordService {
    store: Arc<dyn RecordStore>,
    weather: OpenWeatherClient,
    weather_api_key: Option<String>,
    maps: MapsConfig,
}

impl WeatherRecordService {
    pub fn new(config: &AppConfig, store: Arc<dyn RecordStore>) -> crate::Result<Self> {
        Ok(Self {
            store,
            weather: OpenWeatherClient::new(&config.weather)?,
            weather_api_key: config.weather.api_key.clone(),
            maps: config.maps.clone(),
        })
    }

    fn weather_api_key(&self) -> crate::Result<&str> {
        self.weather_api_key
            .as_deref()
            .ok_or_else(|| WeatherRecordError::config("API key not configured"))
    }

    fn maps_api_key(&self) -> crate::Result<&str> {
        self.maps
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherRecordError::config("Maps API key not configured"))
    }

    fn map_embed_url(&self, maps_key: &str, location: &str) -> String {
        format!(
            "{}/place?key={}&q={}",
            self.maps.embed_base_url.trim_end_matches('/'),
            urlencoding::encode(maps_key),
            urlencoding::encode(location)
        )
    }

    /// Fetch weather for a location and store it as a new record
    #[instrument(skip(self, request), fields(location = %request.location))]
    pub async fn create(&self, request: WeatherRequest) -> crate::Result<WeatherRecord> {
        request.date_range.validate()?;
        let api_key = self.weather_api_key()?;
        let maps_key = self.maps_api_key()?;
        let resolved = LocationResolver::resolve(&request.location)?;

        let payloads = self.weather.fetch(&resolved, api_key).await?;

        let record = NewWeatherRecord {
            google_map_url: self.map_embed_url(maps_key, &request.location),
            location: request.location,
            date_range: request.date_range,
            weather_data: payloads.current,
            forecast_data: payloads.forecast,
            youtube_videos: Vec::new(),
        };

        let id = self.store.insert(record).await?;
        info!(%id, "Created weather record");
        self.store.find_by_id(&id).await
    }

    pub async fn list(&self) -> crate::Result<Vec<WeatherRecord>> {
        self.store.find_all().await
    }

    /// Change location and date range. Weather payloads are not re-fetched.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: &str, request: WeatherRequest) -> crate::Result<WeatherRecord> {
        request.date_range.validate()?;
        let record = self
            .store
            .update_fields(id, request.location, request.date_range)
            .await?;
        info!("Updated weather record");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> crate::Result<()> {
        self.store.delete(id).await?;
        info!("Deleted weather record");
        Ok(())
    }

    /// Candidate places for a free-text query
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> crate::Result<Vec<LocationSuggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherRecordError::validation("Query cannot be empty"));
        }
        let api_key = self.weather_api_key()?;
        self.weather.search(query, api_key).await
    }

    pub async fn export_json(&self) -> crate::Result<Vec<WeatherRecord>> {
        Ok(export::to_json(self.list().await?))
    }

    pub async fn export_csv(&self) -> crate::Result<Vec<u8>> {
        export::to_csv(&self.list().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FjallRecordStore;

    fn service(config: &AppConfig) -> (tempfile::TempDir, WeatherRecordService) {
        let dir = tempfile::tempdir().unwrap();
        let store = FjallRecordStore::open(dir.path().join("db")).unwrap();
        let service = WeatherRecordService::new(config, Arc::new(store)).unwrap();
        (dir, service)
    }

    #[test]
    fn test_map_embed_url_encodes_location() {
        let (_dir, service) = service(&AppConfig::default());
        assert_eq!(
            service.map_embed_url("key123", "New York, NY"),
            "https://www.google.com/maps/embed/v1/place?key=key123&q=New%20York%2C%20NY"
        );
    }

    #[tokio::test]
    async fn test_missing_weather_key_is_config_error() {
        let (_dir, service) = service(&AppConfig::default());
        let err = service.search("Paris").await.unwrap_err();
        assert!(matches!(err, WeatherRecordError::Config { .. }));
    }

    #[tokio::test]
    async fn test_blank_search_query_is_rejected() {
        let (_dir, service) = service(&AppConfig::default());
        let err = service.search("   ").await.unwrap_err();
        assert!(matches!(err, WeatherRecordError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_csv_export_of_empty_store_fails() {
        let (_dir, service) = service(&AppConfig::default());
        let err = service.export_csv().await.unwrap_err();
        assert!(matches!(err, WeatherRecordError::EmptyExport { .. }));
    }
}
