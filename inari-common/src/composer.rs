//! In-progress post state staged across several requests.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// Result of one successful media upload, or one existing media item picked
/// from the archive.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaUpload {
    /// Canonical URL of the hosted file.
    pub url: String,
    /// Timestamp reported by the media endpoint, usually taken from EXIF.
    pub published: String,
    /// Location reported by the media endpoint.
    pub location: Location,
}

/// The post being composed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerData {
    /// Staged photos, in the order they were added.
    pub photos: Vec<MediaUpload>,
    /// Publication date override.
    pub published: String,
    /// Where the post was made.
    pub location: Location,
}

impl ComposerData {
    /// Append a media item.
    ///
    /// A non-empty `published` on the item replaces the composer's (last one wins),
    /// and coordinates on the item replace the composer's coordinates.
    pub fn add_photo(&mut self, photo: MediaUpload) {
        if !photo.published.is_empty() {
            self.published.clone_from(&photo.published);
        }
        if photo.location.has_lat_lng() {
            self.location.lat = photo.location.lat;
            self.location.lng = photo.location.lng;
        }
        self.photos.push(photo);
    }

    /// Replace the location wholesale.
    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Drop everything staged.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// URLs of the staged photos in staging order.
    pub fn photo_urls(&self) -> impl Iterator<Item = &str> {
        self.photos.iter().map(|photo| photo.url.as_str())
    }
}
