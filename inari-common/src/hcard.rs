//! Author metadata discovered from the user's profile page.

use serde::{Deserialize, Serialize};

/// The representative h-card of a profile page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HCard {
    /// Display name.
    pub name: String,
    /// Canonical profile URL.
    pub url: String,
    /// Avatar URL.
    pub photo: String,
}

impl HCard {
    /// True when nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.url.is_empty() && self.photo.is_empty()
    }
}
