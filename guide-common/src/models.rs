//! Landmark entity model
//!
//! Mirrors the guide backend's `/landmarks` JSON contract.

use serde::{Deserialize, Serialize};

/// A point-of-interest entity served by the guide backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Image URL (backend field: `photo_url`)
    #[serde(rename = "photo_url", default)]
    pub photo_url: String,
    #[serde(default)]
    pub location: String,
    /// "lat,lon" string as served by the backend
    #[serde(default)]
    pub coordinates: String,
    /// Categorical tag, also the classifier label for this landmark
    #[serde(default)]
    pub tag: String,
}

/// Response envelope for `GET /landmarks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarksResponse {
    pub landmarks: Vec<Landmark>,
}

impl Landmark {
    /// Case-insensitive exact match on the landmark name
    pub fn matches_name(&self, text: &str) -> bool {
        self.name.eq_ignore_ascii_case(text) || eq_ignore_case_unicode(&self.name, text)
    }

    /// Case-insensitive exact match on name or tag
    pub fn matches_name_or_tag(&self, text: &str) -> bool {
        self.matches_name(text)
            || self.tag.eq_ignore_ascii_case(text)
            || eq_ignore_case_unicode(&self.tag, text)
    }
}

// Landmark names are Cyrillic; ASCII-only case folding is not enough.
fn eq_ignore_case_unicode(a: &str, b: &str) -> bool {
    a.chars().flat_map(char::to_lowercase).eq(b.chars().flat_map(char::to_lowercase))
}
