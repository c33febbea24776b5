//! Wire types exchanged with Micropub and media endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use inari_common::{Location, MediaUpload};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// A file to send to the media endpoint.
#[derive(Clone, Debug, Default)]
pub struct MediaFile {
    /// Original file name, sent in the multipart `filename`.
    pub file_name: String,
    /// MIME type, if the uploader reported one.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

/// Outcome of a Micropub create request.
///
/// Non-2xx statuses are returned here rather than as an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MicropubResponse {
    /// Status returned by the Micropub endpoint.
    pub status: StatusCode,
    /// URL of the new post, from the `Location` header.
    pub location: Option<String>,
}

impl MicropubResponse {
    /// True for a 2xx status.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Body of a media endpoint upload response.
///
/// `url` is replaced by the `Location` header when the endpoint sends one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaEndpointResponse {
    /// Canonical URL of the uploaded file.
    pub url: String,
    /// `geo:` URI read from the file's metadata.
    pub location: String,
    /// Timestamp read from the file's metadata.
    pub published: String,
}

impl From<MediaEndpointResponse> for MediaUpload {
    fn from(response: MediaEndpointResponse) -> Self {
        MediaUpload {
            location: Location::from_geo_uri(&response.location),
            url: response.url,
            published: response.published,
        }
    }
}

/// Response to `q=config`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicropubConfig {
    /// Advertised media endpoint.
    #[serde(rename = "media-endpoint")]
    pub media_endpoint: String,
}

/// Cursor to the next page of a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPaging {
    /// Pass back as `after` to fetch the next page.
    pub after: String,
}

/// A microformats2 item as returned by `q=source`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroFormat {
    /// Item types, e.g. `h-entry`.
    #[serde(rename = "type")]
    pub kind: Vec<String>,
    /// Property values keyed by property name.
    pub properties: BTreeMap<String, Vec<serde_json::Value>>,
    /// Nested items.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MicroFormat>,
}

/// A page of posts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostList {
    /// Posts on this page.
    pub items: Vec<MicroFormat>,
    /// Cursor to the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<ListPaging>,
}

/// Number of posts in one year of the archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveYear {
    /// Four digit year.
    pub year: String,
    /// Posts in that year.
    pub count: u64,
}

/// Number of posts in one month of the archive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveMonth {
    /// Two digit month.
    pub month: String,
    /// Posts in that month.
    pub count: u64,
}

/// One media item hosted by the media endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaItem {
    /// URL of the file.
    pub url: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// When the photo was taken.
    pub date_time: Option<DateTime<Utc>>,
    /// Latitude, 0 when unknown.
    pub lat: f64,
    /// Longitude, 0 when unknown.
    pub lng: f64,
    /// Whether the item is already used by a post.
    pub is_published: bool,
}

impl From<MediaItem> for MediaUpload {
    fn from(item: MediaItem) -> Self {
        MediaUpload {
            published: item
                .date_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            location: Location::from_lat_lng(item.lat, item.lng),
            url: item.url,
        }
    }
}

/// A page of media items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaList {
    /// Items on this page.
    pub items: Vec<MediaItem>,
    /// Cursor to the next page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<ListPaging>,
}

impl MediaList {
    /// The `after` cursor, or an empty string on the last page.
    pub fn after_key(&self) -> &str {
        self.paging
            .as_ref()
            .map(|paging| paging.after.as_str())
            .unwrap_or_default()
    }
}

/// Which page of the media archive to fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaQuery {
    /// First page of a given month.
    Month {
        /// Four digit year.
        year: String,
        /// Two digit month.
        month: String,
    },
    /// The page following a cursor.
    After(String),
}
