//! Catalog Integration Tests
//!
//! Create/update/toggle/delete semantics and listing order against the
//! in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use showreel::store::{Document, DocumentWrite, Query};
use showreel::{DocumentId, DocumentStore, MemoryStore, NewVideo, StoreError, VideoCatalog, VideoPatch};

const RICK: &str = "dQw4w9WgXcQ";
const CUSTOM_THUMB: &str = "https://cdn.example.com/custom.jpg";
const RICK_THUMB: &str = "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg";

fn setup() -> (VideoCatalog, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (VideoCatalog::new(store.clone()), store)
}

/// Eleven-character id that varies in its last character
fn video_id(n: usize) -> String {
    format!("abcdefghij{}", n)
}

#[tokio::test]
async fn test_create_roundtrip_from_short_url() {
    let (catalog, _) = setup();

    let id = catalog
        .create(NewVideo::new("T", "https://youtu.be/dQw4w9WgXcQ"))
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.youtube_video_id.as_str(), RICK);
    assert_eq!(
        video.thumbnail_url.as_deref(),
        Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
    );
}

#[tokio::test]
async fn test_create_rejects_missing_or_invalid_id() {
    let (catalog, store) = setup();

    for input in ["", "not a video", "https://vimeo.com/123456", "https://youtu.be/short"] {
        let err = catalog
            .create(NewVideo::new("T", input))
            .await
            .unwrap_err();
        assert!(err.is_validation(), "input {:?} gave {}", input, err);
    }

    // Nothing reached the store
    assert!(store.is_empty("videos").await);
}

#[tokio::test]
async fn test_create_keeps_supplied_thumbnail() {
    let (catalog, _) = setup();

    let id = catalog
        .create(NewVideo::new("T", RICK).with_thumbnail(CUSTOM_THUMB))
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.thumbnail_url.as_deref(), Some(CUSTOM_THUMB));
}

#[tokio::test]
async fn test_custom_thumbnail_survives_unrelated_update() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("T", RICK)).await.unwrap();

    catalog
        .update(&id, VideoPatch::new().thumbnail(CUSTOM_THUMB))
        .await
        .unwrap();
    catalog
        .update(&id, VideoPatch::new().featured(true))
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.thumbnail_url.as_deref(), Some(CUSTOM_THUMB));
    assert!(video.is_featured);
}

#[tokio::test]
async fn test_custom_thumbnail_survives_id_change() {
    let (catalog, _) = setup();
    let id = catalog
        .create(NewVideo::new("T", RICK).with_thumbnail(CUSTOM_THUMB))
        .await
        .unwrap();

    catalog
        .update(
            &id,
            VideoPatch::new().youtube_video_id("https://www.youtube.com/embed/abcdefghijk"),
        )
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.youtube_video_id.as_str(), "abcdefghijk");
    assert_eq!(video.thumbnail_url.as_deref(), Some(CUSTOM_THUMB));
}

#[tokio::test]
async fn test_derived_thumbnail_follows_id_change() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("T", RICK)).await.unwrap();

    catalog
        .update(
            &id,
            VideoPatch::new().youtube_video_id("https://www.youtube.com/watch?v=abcdefghijk"),
        )
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(
        video.thumbnail_url.as_deref(),
        Some("https://img.youtube.com/vi/abcdefghijk/maxresdefault.jpg")
    );
}

#[tokio::test]
async fn test_supplied_derived_thumbnail_is_regenerated() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("T", RICK)).await.unwrap();

    // A stale derived URL submitted alongside a new id is replaced
    catalog
        .update(
            &id,
            VideoPatch::new()
                .youtube_video_id("abcdefghijk")
                .thumbnail("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"),
        )
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(
        video.thumbnail_url.as_deref(),
        Some("https://img.youtube.com/vi/abcdefghijk/maxresdefault.jpg")
    );
}

#[tokio::test]
async fn test_update_rejects_invalid_id_without_writing() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("Before", RICK)).await.unwrap();

    let err = catalog
        .update(&id, VideoPatch::new().title("After").youtube_video_id("nope"))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.title, "Before");
    assert_eq!(video.youtube_video_id.as_str(), RICK);
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let (catalog, _) = setup();
    let missing = DocumentId::from("missing");

    let err = catalog
        .update(&missing, VideoPatch::new().title("x"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = catalog
        .update(&missing, VideoPatch::new().youtube_video_id(RICK))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert!(catalog.set_published(&missing, true).await.unwrap_err().is_not_found());
    assert!(catalog.set_featured(&missing, true).await.unwrap_err().is_not_found());
    assert!(catalog.get_by_id(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("T", RICK)).await.unwrap();

    catalog.delete(&id).await.unwrap();
    catalog.delete(&id).await.unwrap();

    assert!(catalog.get_by_id(&id).await.unwrap().is_none());
    assert!(catalog.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_featured_truncates_after_sorting() {
    let (catalog, _) = setup();

    for order in [4u32, 2, 0, 3, 1] {
        catalog
            .create(
                NewVideo::new(format!("Video {}", order), video_id(order as usize))
                    .featured(true)
                    .with_display_order(order),
            )
            .await
            .unwrap();
    }

    let featured = catalog.list_featured(2).await.unwrap();
    let orders: Vec<u32> = featured.iter().map(|v| v.display_order).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[tokio::test]
async fn test_list_featured_requires_published() {
    let (catalog, _) = setup();

    catalog
        .create(NewVideo::new("Hidden", video_id(1)).featured(true).published(false))
        .await
        .unwrap();
    catalog
        .create(NewVideo::new("Shown", video_id(2)).featured(true))
        .await
        .unwrap();
    catalog
        .create(NewVideo::new("Plain", video_id(3)))
        .await
        .unwrap();

    let featured = catalog.list_featured(10).await.unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].title, "Shown");
}

#[tokio::test]
async fn test_list_categories() {
    let (catalog, _) = setup();

    let inputs = [("B", true), ("A", true), ("B", true), ("", false)];
    for (n, (category, published)) in inputs.into_iter().enumerate() {
        catalog
            .create(
                NewVideo::new("T", video_id(n))
                    .with_category(category)
                    .published(published),
            )
            .await
            .unwrap();
    }

    assert_eq!(catalog.list_categories().await.unwrap(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_list_categories_skips_empty_published() {
    let (catalog, _) = setup();

    catalog
        .create(NewVideo::new("T", video_id(1)).with_category(""))
        .await
        .unwrap();
    catalog
        .create(NewVideo::new("T", video_id(2)))
        .await
        .unwrap();

    assert!(catalog.list_categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_by_category() {
    let (catalog, _) = setup();

    catalog
        .create(NewVideo::new("Second", video_id(1)).with_category("Events").with_display_order(2))
        .await
        .unwrap();
    catalog
        .create(NewVideo::new("First", video_id(2)).with_category("Events").with_display_order(1))
        .await
        .unwrap();
    catalog
        .create(
            NewVideo::new("Hidden", video_id(3))
                .with_category("Events")
                .published(false),
        )
        .await
        .unwrap();
    catalog
        .create(NewVideo::new("Other", video_id(4)).with_category("Talks"))
        .await
        .unwrap();

    let titles: Vec<String> = catalog
        .list_by_category("Events")
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.title)
        .collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[tokio::test]
async fn test_unpublish_hides_from_public_listings() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("T", RICK)).await.unwrap();

    catalog.set_published(&id, false).await.unwrap();

    let published = catalog.list_published().await.unwrap();
    assert!(published.iter().all(|v| v.id != id));

    let all = catalog.list_all().await.unwrap();
    assert!(all.iter().any(|v| v.id == id));

    catalog.set_published(&id, true).await.unwrap();
    assert_eq!(catalog.list_published().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_all_sorted_by_display_order() {
    let (catalog, _) = setup();

    for order in [10u32, 0, 5] {
        catalog
            .create(
                NewVideo::new("T", video_id(order as usize % 10))
                    .with_display_order(order)
                    .published(order != 5),
            )
            .await
            .unwrap();
    }

    let orders: Vec<u32> = catalog
        .list_all()
        .await
        .unwrap()
        .iter()
        .map(|v| v.display_order)
        .collect();
    assert_eq!(orders, vec![0, 5, 10]);
}

#[tokio::test]
async fn test_update_patches_only_supplied_fields() {
    let (catalog, _) = setup();
    let id = catalog
        .create(
            NewVideo::new("Title", RICK)
                .with_description("Original")
                .with_tags(["a", "b"])
                .with_category("Events"),
        )
        .await
        .unwrap();

    catalog
        .update(
            &id,
            VideoPatch::new()
                .description("  Rewritten  ")
                .tags(["c"])
                .display_order(7),
        )
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.title, "Title");
    assert_eq!(video.description, "Rewritten");
    assert_eq!(video.tags, vec!["c"]);
    assert_eq!(video.category(), Some("Events"));
    assert_eq!(video.display_order, 7);
    assert_eq!(video.youtube_video_id.as_str(), RICK);
}

#[tokio::test]
async fn test_blank_thumbnail_on_create_is_derived() {
    let (catalog, _) = setup();

    for blank in ["", "   "] {
        let id = catalog
            .create(NewVideo::new("T", RICK).with_thumbnail(blank))
            .await
            .unwrap();

        let video = catalog.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(video.thumbnail_url.as_deref(), Some(RICK_THUMB), "input {:?}", blank);
    }
}

#[tokio::test]
async fn test_blank_thumbnail_on_update_keeps_stored() {
    let (catalog, _) = setup();
    let id = catalog
        .create(NewVideo::new("T", RICK).with_thumbnail(CUSTOM_THUMB))
        .await
        .unwrap();

    catalog
        .update(&id, VideoPatch::new().title("Renamed").thumbnail(""))
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(video.title, "Renamed");
    assert_eq!(video.thumbnail_url.as_deref(), Some(CUSTOM_THUMB));
}

#[tokio::test]
async fn test_blank_thumbnail_with_id_change_regenerates() {
    let (catalog, _) = setup();
    let id = catalog.create(NewVideo::new("T", RICK)).await.unwrap();

    catalog
        .update(
            &id,
            VideoPatch::new().youtube_video_id("abcdefghijk").thumbnail("  "),
        )
        .await
        .unwrap();

    let video = catalog.get_by_id(&id).await.unwrap().unwrap();
    assert_eq!(
        video.thumbnail_url.as_deref(),
        Some("https://img.youtube.com/vi/abcdefghijk/maxresdefault.jpg")
    );
}

/// Store that refuses every call, counting attempts
#[derive(Default)]
struct UnavailableStore {
    calls: AtomicUsize,
}

impl UnavailableStore {
    fn refuse(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Unavailable("connection refused".to_string())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for UnavailableStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn insert(&self, _: &str, _: DocumentWrite) -> Result<DocumentId, StoreError> {
        Err(self.refuse())
    }

    async fn get(&self, _: &str, _: &DocumentId) -> Result<Option<Document>, StoreError> {
        Err(self.refuse())
    }

    async fn patch(&self, _: &str, _: &DocumentId, _: DocumentWrite) -> Result<(), StoreError> {
        Err(self.refuse())
    }

    async fn delete(&self, _: &str, _: &DocumentId) -> Result<(), StoreError> {
        Err(self.refuse())
    }

    async fn query(&self, _: &str, _: &Query) -> Result<Vec<Document>, StoreError> {
        Err(self.refuse())
    }
}

#[tokio::test]
async fn test_unavailable_store_surfaces_transient_without_retry() {
    let store = Arc::new(UnavailableStore::default());
    let catalog = VideoCatalog::new(store.clone());

    let err = catalog.create(NewVideo::new("T", RICK)).await.unwrap_err();
    assert!(err.is_transient(), "got {}", err);
    assert!(!err.is_validation());
    assert_eq!(store.calls(), 1);

    let err = catalog.list_all().await.unwrap_err();
    assert!(err.is_transient(), "got {}", err);
    assert_eq!(store.calls(), 2);

    let id = DocumentId::from("any");
    assert!(catalog.get_by_id(&id).await.unwrap_err().is_transient());
    assert!(catalog.set_published(&id, true).await.unwrap_err().is_transient());
    assert!(catalog.delete(&id).await.unwrap_err().is_transient());
    assert_eq!(store.calls(), 5);
}

#[tokio::test]
async fn test_validation_precedes_store_access() {
    let store = Arc::new(UnavailableStore::default());
    let catalog = VideoCatalog::new(store.clone());

    let err = catalog.create(NewVideo::new("T", "not a video")).await.unwrap_err();
    assert!(err.is_validation());
    assert!(!err.is_transient());
    assert_eq!(store.calls(), 0);
}
