//! Video catalog operations.
//!
//! `VideoCatalog` validates and normalizes editor input, then issues one
//! store call per operation. It keeps no cache: every read re-queries the
//! store, and concurrent writers are resolved last-write-wins by the store.

pub mod error;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::domain::video::fields;
use crate::domain::youtube::{Thumbnail, YoutubeId, DEFAULT_QUALITY};
use crate::domain::{NewVideo, VideoEntry, VideoPatch};
use crate::store::{Document, DocumentId, DocumentStore, DocumentWrite, Query};

pub use error::CatalogError;

/// Default collection name
pub const DEFAULT_COLLECTION: &str = "videos";

/// Catalog of YouTube videos over a document store
#[derive(Clone)]
pub struct VideoCatalog {
    store: Arc<dyn DocumentStore>,
    collection: String,
    thumbnail_quality: String,
}

impl VideoCatalog {
    /// Create a catalog over `store` using the default collection
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: DEFAULT_COLLECTION.to_string(),
            thumbnail_quality: DEFAULT_QUALITY.to_string(),
        }
    }

    /// Use a different collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Use a different quality tier for derived thumbnails
    pub fn with_thumbnail_quality(mut self, quality: impl Into<String>) -> Self {
        self.thumbnail_quality = quality.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn thumbnail_quality(&self) -> &str {
        &self.thumbnail_quality
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a video and return its id
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: NewVideo) -> Result<DocumentId, CatalogError> {
        let youtube_id = normalize_id(&input.youtube_video_id)?;

        let thumbnail = non_blank(input.thumbnail_url)
            .unwrap_or_else(|| youtube_id.thumbnail(&self.thumbnail_quality));

        let mut write = DocumentWrite::new()
            .set(fields::TITLE, input.title.trim())
            .set(
                fields::DESCRIPTION,
                input.description.as_deref().unwrap_or_default().trim(),
            )
            .set(fields::YOUTUBE_VIDEO_ID, youtube_id.as_str())
            .set(fields::TAGS, input.tags.unwrap_or_default())
            .set(fields::THUMBNAIL_URL, thumbnail)
            .set(fields::IS_FEATURED, input.is_featured.unwrap_or(false))
            .set(fields::IS_PUBLISHED, input.is_published.unwrap_or(true))
            .set(fields::DISPLAY_ORDER, input.display_order.unwrap_or(0))
            .server_timestamp(fields::CREATED_AT)
            .server_timestamp(fields::UPDATED_AT);

        if let Some(url) = input.youtube_channel_url {
            write = write.set(fields::YOUTUBE_CHANNEL_URL, url);
        }
        if let Some(category) = input.category {
            write = write.set(fields::CATEGORY, category);
        }

        let id = self.store.insert(&self.collection, write).await?;
        info!(%id, youtube_id = %youtube_id, "Video created");

        Ok(id)
    }

    /// Apply a partial update
    ///
    /// A new video id regenerates a derived (or absent) thumbnail; a custom
    /// thumbnail, supplied in the patch or already stored, is kept.
    #[instrument(skip(self, patch), fields(%id))]
    pub async fn update(&self, id: &DocumentId, patch: VideoPatch) -> Result<(), CatalogError> {
        let youtube_id = patch
            .youtube_video_id
            .as_deref()
            .map(normalize_id)
            .transpose()?;

        let mut write = DocumentWrite::new();

        if let Some(title) = &patch.title {
            write = write.set(fields::TITLE, title.trim());
        }
        if let Some(description) = &patch.description {
            write = write.set(fields::DESCRIPTION, description.trim());
        }
        if let Some(url) = patch.youtube_channel_url {
            write = write.set(fields::YOUTUBE_CHANNEL_URL, url);
        }
        if let Some(category) = patch.category {
            write = write.set(fields::CATEGORY, category);
        }
        if let Some(tags) = patch.tags {
            write = write.set(fields::TAGS, tags);
        }
        if let Some(value) = patch.is_featured {
            write = write.set(fields::IS_FEATURED, value);
        }
        if let Some(value) = patch.is_published {
            write = write.set(fields::IS_PUBLISHED, value);
        }
        if let Some(order) = patch.display_order {
            write = write.set(fields::DISPLAY_ORDER, order);
        }

        let supplied = non_blank(patch.thumbnail_url).map(Thumbnail::classify);

        match youtube_id {
            Some(youtube_id) => {
                write = write.set(fields::YOUTUBE_VIDEO_ID, youtube_id.as_str());

                let keep = match supplied {
                    Some(Thumbnail::Custom(url)) => Some(Thumbnail::Custom(url)),
                    Some(Thumbnail::Derived(_)) => None,
                    None => self.stored_thumbnail(id).await?.filter(Thumbnail::is_custom),
                };

                match keep {
                    Some(Thumbnail::Custom(url)) => {
                        write = write.set(fields::THUMBNAIL_URL, url);
                    }
                    _ => {
                        let derived = youtube_id.thumbnail(&self.thumbnail_quality);
                        debug!(thumbnail = %derived, "Regenerating thumbnail");
                        write = write.set(fields::THUMBNAIL_URL, derived);
                    }
                }
            }
            None => {
                if let Some(thumbnail) = supplied {
                    write = write.set(fields::THUMBNAIL_URL, thumbnail.url());
                }
            }
        }

        write = write.server_timestamp(fields::UPDATED_AT);
        self.store.patch(&self.collection, id, write).await?;
        info!("Video updated");

        Ok(())
    }

    /// Remove a video. Missing ids are not an error.
    #[instrument(skip(self), fields(%id))]
    pub async fn delete(&self, id: &DocumentId) -> Result<(), CatalogError> {
        self.store.delete(&self.collection, id).await?;
        info!("Video deleted");
        Ok(())
    }

    /// Publish or unpublish a video
    #[instrument(skip(self), fields(%id))]
    pub async fn set_published(&self, id: &DocumentId, value: bool) -> Result<(), CatalogError> {
        self.set_flag(id, fields::IS_PUBLISHED, value).await
    }

    /// Feature or unfeature a video
    #[instrument(skip(self), fields(%id))]
    pub async fn set_featured(&self, id: &DocumentId, value: bool) -> Result<(), CatalogError> {
        self.set_flag(id, fields::IS_FEATURED, value).await
    }

    async fn set_flag(&self, id: &DocumentId, field: &str, value: bool) -> Result<(), CatalogError> {
        let write = DocumentWrite::new()
            .set(field, value)
            .server_timestamp(fields::UPDATED_AT);

        self.store.patch(&self.collection, id, write).await?;
        info!(field, value, "Video flag set");
        Ok(())
    }

    async fn stored_thumbnail(&self, id: &DocumentId) -> Result<Option<Thumbnail>, CatalogError> {
        let doc = self.store.get(&self.collection, id).await?;

        Ok(doc
            .and_then(|d| match d.fields.get(fields::THUMBNAIL_URL) {
                Some(Value::String(url)) if !url.is_empty() => Some(url.clone()),
                _ => None,
            })
            .map(Thumbnail::classify))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Every video, ascending by display order
    pub async fn list_all(&self) -> Result<Vec<VideoEntry>, CatalogError> {
        self.run(Query::new().order_by(fields::DISPLAY_ORDER)).await
    }

    /// Published videos, ascending by display order
    pub async fn list_published(&self) -> Result<Vec<VideoEntry>, CatalogError> {
        self.run(
            Query::new()
                .where_eq(fields::IS_PUBLISHED, true)
                .order_by(fields::DISPLAY_ORDER),
        )
        .await
    }

    /// The first `limit` published and featured videos
    ///
    /// The whole matching set is fetched and then truncated.
    pub async fn list_featured(&self, limit: usize) -> Result<Vec<VideoEntry>, CatalogError> {
        let mut videos = self
            .run(
                Query::new()
                    .where_eq(fields::IS_PUBLISHED, true)
                    .where_eq(fields::IS_FEATURED, true)
                    .order_by(fields::DISPLAY_ORDER),
            )
            .await?;

        videos.truncate(limit);
        Ok(videos)
    }

    /// Look up a single video; `None` if absent
    pub async fn get_by_id(&self, id: &DocumentId) -> Result<Option<VideoEntry>, CatalogError> {
        self.store
            .get(&self.collection, id)
            .await?
            .map(decode)
            .transpose()
    }

    /// Published videos in one category, ascending by display order
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<VideoEntry>, CatalogError> {
        self.run(
            Query::new()
                .where_eq(fields::IS_PUBLISHED, true)
                .where_eq(fields::CATEGORY, category)
                .order_by(fields::DISPLAY_ORDER),
        )
        .await
    }

    /// Distinct non-empty categories of published videos, sorted
    pub async fn list_categories(&self) -> Result<Vec<String>, CatalogError> {
        let categories: BTreeSet<String> = self
            .list_published()
            .await?
            .iter()
            .filter_map(|v| v.category().map(str::to_string))
            .collect();

        Ok(categories.into_iter().collect())
    }

    async fn run(&self, query: Query) -> Result<Vec<VideoEntry>, CatalogError> {
        let docs = self.store.query(&self.collection, &query).await?;
        debug!(count = docs.len(), "Query returned");
        docs.into_iter().map(decode).collect()
    }
}

/// Extract and validate a raw form value
fn normalize_id(input: &str) -> Result<YoutubeId, CatalogError> {
    YoutubeId::parse(input).ok_or_else(|| {
        if input.trim().is_empty() {
            CatalogError::Validation("YouTube video id is required".to_string())
        } else {
            CatalogError::Validation(format!("Invalid YouTube URL or video id: {}", input.trim()))
        }
    })
}

/// Blank form values count as "not supplied"
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn decode(doc: Document) -> Result<VideoEntry, CatalogError> {
    let id = doc.id.to_string();
    serde_json::from_value(doc.into_value()).map_err(|source| CatalogError::Decode { id, source })
}
