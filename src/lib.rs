//! showreel - YouTube video catalog over a document store
//!
//! Keeps a moderated, ordered collection of videos for a marketing site:
//! editors paste any YouTube URL, the catalog stores the canonical id,
//! derives a thumbnail, and serves published/featured/category listings.
//!
//! # Modules
//!
//! - `domain`: Data structures (VideoEntry, NewVideo, VideoPatch) and YouTube id rules
//! - `store`: Document store trait plus memory and SQLite backends
//! - `catalog`: VideoCatalog operations
//! - `config`: Config file and environment resolution
//! - `cli`: Command-line admin interface
//!
//! # Usage
//!
//! ```bash
//! # Add a video
//! showreel add https://youtu.be/dQw4w9WgXcQ --title "Launch film" --category Events
//!
//! # Public listings
//! showreel list --published
//! showreel list --featured --limit 3
//!
//! # Moderation
//! showreel unpublish <id>
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use catalog::{CatalogError, VideoCatalog};
pub use domain::{NewVideo, Thumbnail, VideoEntry, VideoPatch, YoutubeId};
pub use store::{DocumentId, DocumentStore, MemoryStore, SqliteStore, StoreError};
