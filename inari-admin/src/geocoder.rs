//! Address lookup for the location picker.

use std::sync::Arc;

use async_trait::async_trait;
use inari_common::Location;
use serde::Deserialize;
use url::Url;

use crate::data_directory::GeocoderToml;

#[async_trait]
pub trait Geocoder: std::fmt::Debug + Send + Sync {
    /// Candidate locations for a free form address.
    async fn lookup(&self, address: &str) -> anyhow::Result<Vec<Location>>;
}

/// Finds nothing. Used when no geocoding service is configured.
#[derive(Debug, Clone, Default)]
pub struct NullGeocoder;

#[async_trait]
impl Geocoder for NullGeocoder {
    async fn lookup(&self, _address: &str) -> anyhow::Result<Vec<Location>> {
        Ok(Vec::new())
    }
}

/// Google Geocoding API client.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(http: reqwest::Client, base_url: Url, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// [`NullGeocoder`] unless an API key is configured.
    pub fn from_config(
        http: reqwest::Client,
        config: &GeocoderToml,
    ) -> anyhow::Result<Arc<dyn Geocoder>> {
        if config.api_key.is_empty() {
            return Ok(Arc::new(NullGeocoder));
        }
        let base_url = Url::parse(&config.base_url)?;
        Ok(Arc::new(Self::new(http, base_url, config.api_key.clone())))
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> anyhow::Result<Vec<Location>> {
        if address.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("address", address)
            .append_pair("key", &self.api_key);

        let response: GeocodeResponse = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if !matches!(response.status.as_str(), "OK" | "ZERO_RESULTS") {
            tracing::warn!(status = %response.status, address, "Geocoding failed");
        }

        Ok(response.results.iter().map(GeocodeResult::to_location).collect())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
    status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeocodeResult {
    address_components: Vec<AddressComponent>,
    geometry: Geometry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddressComponent {
    long_name: String,
    types: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LatLng {
    lat: f64,
    lng: f64,
}

impl GeocodeResult {
    fn component(&self, kinds: &[&str]) -> String {
        kinds
            .iter()
            .find_map(|kind| {
                self.address_components
                    .iter()
                    .find(|c| c.types.iter().any(|t| t == kind))
            })
            .map(|c| c.long_name.clone())
            .unwrap_or_default()
    }

    fn to_location(&self) -> Location {
        Location {
            locality: self.component(&["locality", "postal_town", "neighborhood"]),
            region: self.component(&["administrative_area_level_2", "administrative_area_level_1"]),
            country: self.component(&["country"]),
            lat: self.geometry.location.lat,
            lng: self.geometry.location.lng,
        }
    }
}
