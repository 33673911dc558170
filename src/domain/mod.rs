//! Domain types for the video catalog.
//!
//! - Video: the stored entry plus create/patch inputs
//! - YouTube: id extraction, validation and thumbnail derivation

pub mod video;
pub mod youtube;

// Re-export commonly used types
pub use video::{NewVideo, VideoEntry, VideoPatch};
pub use youtube::{extract_id, is_valid_id, thumbnail_url, Thumbnail, YoutubeId};
