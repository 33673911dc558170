//! The video entry and its create/update inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::youtube::YoutubeId;
use crate::store::DocumentId;

/// Stored field names
pub mod fields {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const YOUTUBE_VIDEO_ID: &str = "youtubeVideoId";
    pub const YOUTUBE_CHANNEL_URL: &str = "youtubeChannelUrl";
    pub const CATEGORY: &str = "category";
    pub const TAGS: &str = "tags";
    pub const THUMBNAIL_URL: &str = "thumbnailUrl";
    pub const IS_FEATURED: &str = "isFeatured";
    pub const IS_PUBLISHED: &str = "isPublished";
    pub const DISPLAY_ORDER: &str = "displayOrder";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// A video in the catalog, as read from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    /// Store-assigned id
    pub id: DocumentId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Canonical 11-character video id
    pub youtube_video_id: YoutubeId,

    #[serde(default)]
    pub youtube_channel_url: Option<String>,

    /// Grouping key for the public gallery
    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Derived from the video id unless an editor supplied one
    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default = "default_published")]
    pub is_published: bool,

    /// Ascending sort key for every listing
    #[serde(default)]
    pub display_order: u32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_published() -> bool {
    true
}

impl VideoEntry {
    /// Watch URL for the public page
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.youtube_video_id)
    }

    /// Embed URL for the player iframe
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.youtube_video_id)
    }

    /// Non-empty category, if any
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }
}

/// Input for creating a video
///
/// `youtube_video_id` is the raw form value: a bare id or any accepted URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub youtube_video_id: String,
    #[serde(default)]
    pub youtube_channel_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub display_order: Option<u32>,
}

impl NewVideo {
    /// Create input with a title and a raw video id or URL
    pub fn new(title: impl Into<String>, youtube_video_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            youtube_video_id: youtube_video_id.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_channel_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_channel_url = Some(url.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    /// Add multiple tags
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags
            .get_or_insert_with(Vec::new)
            .extend(tags.into_iter().map(Into::into));
        self
    }

    /// Use a custom thumbnail instead of the derived one
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn featured(mut self, value: bool) -> Self {
        self.is_featured = Some(value);
        self
    }

    pub fn published(mut self, value: bool) -> Self {
        self.is_published = Some(value);
        self
    }

    pub fn with_display_order(mut self, order: u32) -> Self {
        self.display_order = Some(order);
        self
    }
}

/// Partial update. `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Raw form value; re-validated only when present
    #[serde(default)]
    pub youtube_video_id: Option<String>,
    #[serde(default)]
    pub youtube_channel_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub display_order: Option<u32>,
}

impl VideoPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn youtube_video_id(mut self, input: impl Into<String>) -> Self {
        self.youtube_video_id = Some(input.into());
        self
    }

    pub fn channel_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_channel_url = Some(url.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn featured(mut self, value: bool) -> Self {
        self.is_featured = Some(value);
        self
    }

    pub fn published(mut self, value: bool) -> Self {
        self.is_published = Some(value);
        self
    }

    pub fn display_order(mut self, order: u32) -> Self {
        self.display_order = Some(order);
        self
    }

    /// True if applying the patch would only refresh `updatedAt`
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_deserializes_with_defaults() {
        let value = json!({
            "id": "abc",
            "title": "Launch film",
            "youtubeVideoId": "dQw4w9WgXcQ",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
        });

        let entry: VideoEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.id.as_str(), "abc");
        assert!(entry.is_published);
        assert!(!entry.is_featured);
        assert_eq!(entry.display_order, 0);
        assert!(entry.tags.is_empty());
        assert!(entry.thumbnail_url.is_none());
        assert_eq!(entry.embed_url(), "https://www.youtube.com/embed/dQw4w9WgXcQ");
    }

    #[test]
    fn test_empty_category_is_none() {
        let value = json!({
            "id": "abc",
            "title": "T",
            "youtubeVideoId": "dQw4w9WgXcQ",
            "category": "",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
        });

        let entry: VideoEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.category(), None);
    }

    #[test]
    fn test_new_video_builder() {
        let input = NewVideo::new("Launch", "https://youtu.be/dQw4w9WgXcQ")
            .with_category("Events")
            .with_tag("launch")
            .with_tags(["2024", "keynote"])
            .featured(true);

        assert_eq!(input.category.as_deref(), Some("Events"));
        assert_eq!(input.tags.unwrap(), vec!["launch", "2024", "keynote"]);
        assert_eq!(input.is_featured, Some(true));
        assert_eq!(input.is_published, None);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(VideoPatch::new().is_empty());
        assert!(!VideoPatch::new().featured(false).is_empty());
    }
}
