//! YouTube identifier normalization and thumbnail derivation.
//!
//! Anything pasted into the admin form (bare id, watch URL, embed URL,
//! short link) goes through [`extract_id`] and [`is_valid_id`] before it
//! reaches the store. Only the canonical 11-character id is persisted.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Host used by derived thumbnail URLs
pub const THUMBNAIL_HOST: &str = "img.youtube.com";

/// Default thumbnail quality tier
pub const DEFAULT_QUALITY: &str = "maxresdefault";

/// Thumbnail tiers YouTube serves. Not enforced by [`thumbnail_url`].
pub const QUALITY_TIERS: [&str; 5] = ["maxresdefault", "hqdefault", "mqdefault", "sddefault", "default"];

static CANONICAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

// Checked in order; the first capture wins.
static URL_SHAPES: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"watch\?v=([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"embed/([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"youtu\.be/([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"/v/([A-Za-z0-9_-]{11})").unwrap(),
    ]
});

/// Extract the canonical video id from a bare id or a YouTube URL.
///
/// Surrounding whitespace is trimmed before matching, so `" dQw4w9WgXcQ "`
/// yields `"dQw4w9WgXcQ"`. Returns `None` when no accepted shape matches.
/// There is no best-effort fallback: a URL that merely mentions YouTube is
/// rejected.
pub fn extract_id(input: &str) -> Option<String> {
    let input = input.trim();

    if CANONICAL_ID.is_match(input) {
        return Some(input.to_string());
    }

    URL_SHAPES
        .iter()
        .find_map(|shape| shape.captures(input))
        .map(|caps| caps[1].to_string())
}

/// True iff `id` is exactly 11 characters of `[A-Za-z0-9_-]`
pub fn is_valid_id(id: &str) -> bool {
    CANONICAL_ID.is_match(id)
}

/// Build the thumbnail URL for a video id at the given quality tier.
///
/// The tier is inserted verbatim.
pub fn thumbnail_url(id: &str, quality: &str) -> String {
    format!("https://{}/vi/{}/{}.jpg", THUMBNAIL_HOST, id, quality)
}

/// Whether a thumbnail URL was derived from a video id (host heuristic)
pub fn is_derived_thumbnail(url: &str) -> bool {
    url.contains(THUMBNAIL_HOST)
}

/// A validated, canonical YouTube video id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YoutubeId(String);

impl YoutubeId {
    /// Run the extraction pipeline; `None` if the input cannot be normalized
    pub fn parse(input: &str) -> Option<Self> {
        extract_id(input)
            .filter(|id| is_valid_id(id))
            .map(Self)
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derived thumbnail URL for this id
    pub fn thumbnail(&self, quality: &str) -> String {
        thumbnail_url(&self.0, quality)
    }
}

impl fmt::Display for YoutubeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A thumbnail URL classified by where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Thumbnail {
    /// Built from the video id; safe to regenerate
    Derived(String),

    /// Supplied by an editor; must survive updates
    Custom(String),
}

impl Thumbnail {
    /// Classify a stored or supplied URL
    pub fn classify(url: impl Into<String>) -> Self {
        let url = url.into();
        if is_derived_thumbnail(&url) {
            Self::Derived(url)
        } else {
            Self::Custom(url)
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Derived(url) | Self::Custom(url) => url,
        }
    }
}
