//! Location Resolution Module
//!
//! Classifies a free-form location string into coordinates, a postal code or
//! a place name, and turns the result into provider query parameters.

use tracing::debug;

use crate::WeatherRecordError;

/// Classified location, ready to be sent to the weather provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    /// Latitude and longitude, kept as the user typed them (trimmed)
    Coordinates { lat: String, lon: String },
    /// Postal / ZIP code
    PostalCode(String),
    /// City name or landmark
    Name(String),
}

impl ResolvedLocation {
    /// Query parameters understood by both the current weather and forecast endpoints
    #[must_use]
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Coordinates { lat, lon } => vec![("lat", lat.clone()), ("lon", lon.clone())],
            Self::PostalCode(zip) => vec![("zip", zip.clone())],
            Self::Name(q) => vec![("q", q.clone())],
        }
    }
}

/// Location parsing utilities
pub struct LocationResolver;

impl LocationResolver {
    /// Classify a location string.
    ///
    /// Anything containing a comma must be exactly `lat,lon`; an all-digit
    /// string is a postal code; everything else is passed through as a name.
    pub fn resolve(input: &str) -> crate::Result<ResolvedLocation> {
        let resolved = if input.contains(',') {
            let (lat, lon) = Self::parse_coordinates(input)?;
            ResolvedLocation::Coordinates { lat, lon }
        } else if Self::is_postal_code(input) {
            ResolvedLocation::PostalCode(input.to_string())
        } else {
            ResolvedLocation::Name(input.to_string())
        };

        debug!("Resolved location {:?} as {:?}", input, resolved);
        Ok(resolved)
    }

    fn parse_coordinates(input: &str) -> crate::Result<(String, String)> {
        let parts: Vec<&str> = input.split(',').collect();
        match parts.as_slice() {
            [lat, lon] => Ok((lat.trim().to_string(), lon.trim().to_string())),
            _ => Err(WeatherRecordError::validation(
                "Invalid coordinate format. Use 'lat,lon'.",
            )),
        }
    }

    fn is_postal_code(input: &str) -> bool {
        !input.is_empty() && input.chars().all(|c| c.is_ascii_digit())
    }
}
