//! Geographic location attached to a post or a media item.

use serde::{Deserialize, Serialize};

const GEO_SCHEME: &str = "geo:";

/// A place, either picked by the user or read from a photo's metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Town or city.
    pub locality: String,
    /// County, state or province.
    pub region: String,
    /// Country name.
    pub country: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
}

impl Location {
    /// Location with coordinates only.
    pub fn from_lat_lng(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            ..Default::default()
        }
    }

    /// Parse a `geo:` URI such as `geo:53.83,-1.57`.
    ///
    /// Anything after the coordinate pair (altitude, `;u=` parameters) is ignored.
    /// Input that doesn't parse yields an empty location.
    pub fn from_geo_uri(uri: &str) -> Self {
        let Some(rest) = uri.trim().strip_prefix(GEO_SCHEME) else {
            return Self::default();
        };
        let coords = rest.split(';').next().unwrap_or_default();
        let mut parts = coords.split(',').map(str::trim);

        match (
            parts.next().and_then(|p| p.parse::<f64>().ok()),
            parts.next().and_then(|p| p.parse::<f64>().ok()),
        ) {
            (Some(lat), Some(lng)) => Self::from_lat_lng(lat, lng),
            _ => Self::default(),
        }
    }

    /// True when at least one coordinate is set.
    pub fn has_lat_lng(&self) -> bool {
        self.lat != 0.0 || self.lng != 0.0
    }

    /// Render the coordinates as a `geo:` URI.
    pub fn to_geo_url(&self) -> String {
        format!("{GEO_SCHEME}{},{}", self.lat, self.lng)
    }

    /// Human readable form: the non-empty of locality, region and country.
    pub fn to_human(&self) -> String {
        [&self.locality, &self.region, &self.country]
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
