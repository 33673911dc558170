//! Command-line interface for showreel.
//!
//! Admin surface over the video catalog: listing, inspecting, creating,
//! editing, deleting, and toggling published/featured flags.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::catalog::VideoCatalog;
use crate::config::{self, CatalogSettings, ResolvedConfig, StoreBackend};
use crate::domain::youtube::{self, DEFAULT_QUALITY};
use crate::domain::{NewVideo, VideoEntry, VideoPatch};
use crate::store::DocumentId;

/// showreel - YouTube video catalog admin
#[derive(Parser, Debug)]
#[command(name = "showreel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List videos (all by default)
    List {
        /// Only published videos
        #[arg(long, conflicts_with_all = ["featured", "category"])]
        published: bool,

        /// Only published + featured videos
        #[arg(long, conflicts_with = "category")]
        featured: bool,

        /// Maximum featured videos (defaults to the configured limit)
        #[arg(short, long, requires = "featured")]
        limit: Option<usize>,

        /// Only published videos in this category
        #[arg(short, long)]
        category: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one video
    Show {
        /// Video document ID
        id: String,
    },

    /// Add a video from a YouTube URL or bare id
    Add {
        /// YouTube URL or 11-character video id
        video: String,

        /// Video title
        #[arg(short, long)]
        title: String,

        #[command(flatten)]
        fields: VideoFields,

        /// Create unpublished (hidden from public listings)
        #[arg(long)]
        unpublished: bool,

        /// Mark as featured
        #[arg(long)]
        featured: bool,
    },

    /// Edit an existing video
    Edit {
        /// Video document ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New YouTube URL or video id
        #[arg(long)]
        video: Option<String>,

        #[command(flatten)]
        fields: VideoFields,
    },

    /// Delete a video
    Rm {
        /// Video document ID
        id: String,
    },

    /// Publish a video
    Publish { id: String },

    /// Unpublish a video
    Unpublish { id: String },

    /// Feature a video
    Feature { id: String },

    /// Unfeature a video
    Unfeature { id: String },

    /// List categories of published videos
    Categories,

    /// Extract the video id and thumbnail from a URL (no store access)
    Parse {
        /// YouTube URL or video id
        input: String,

        /// Thumbnail quality tier
        #[arg(short, long, default_value = DEFAULT_QUALITY)]
        quality: String,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Optional fields shared by `add` and `edit`
#[derive(Args, Debug, Default)]
pub struct VideoFields {
    /// Description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Tags (comma-separated)
    #[arg(long)]
    pub tags: Option<String>,

    /// Custom thumbnail URL
    #[arg(long)]
    pub thumbnail: Option<String>,

    /// YouTube channel URL
    #[arg(long)]
    pub channel: Option<String>,

    /// Display order (ascending)
    #[arg(short, long)]
    pub order: Option<u32>,
}

fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Parse { input, quality } => parse_input(&input, &quality),
            Commands::Config => show_config(),
            command => {
                let cfg = config::config()?;
                require_persistent(cfg)?;
                let catalog = cfg.catalog()?;
                run_command(command, &catalog, &cfg.catalog).await
            }
        }
    }
}

/// The memory backend forgets everything when the process exits, so it is
/// only usable when embedding the library or in tests.
fn require_persistent(cfg: &ResolvedConfig) -> Result<()> {
    if cfg.backend == StoreBackend::Memory {
        anyhow::bail!(
            "The memory store does not persist between commands. \
             Set SHOWREEL_STORE=sqlite (or store.backend: sqlite) to use the CLI."
        );
    }
    Ok(())
}

/// Run a store-backed command against a catalog
pub async fn run_command(
    command: Commands,
    catalog: &VideoCatalog,
    settings: &CatalogSettings,
) -> Result<()> {
    match command {
        Commands::List {
            published,
            featured,
            limit,
            category,
            json,
        } => {
            let videos = if featured {
                catalog
                    .list_featured(limit.unwrap_or(settings.featured_limit))
                    .await?
            } else if let Some(category) = category {
                catalog.list_by_category(&category).await?
            } else if published {
                catalog.list_published().await?
            } else {
                catalog.list_all().await?
            };
            print_videos(&videos, json)
        }
        Commands::Show { id } => {
            let id = DocumentId::from(id);
            let video = catalog
                .get_by_id(&id)
                .await?
                .with_context(|| format!("Video not found: {}", id))?;
            print_video(&video);
            Ok(())
        }
        Commands::Add {
            video,
            title,
            fields,
            unpublished,
            featured,
        } => {
            let mut input = NewVideo::new(title, video)
                .published(!unpublished)
                .featured(featured);

            input.description = fields.description;
            input.category = fields.category;
            input.tags = fields.tags.as_deref().map(split_tags);
            input.thumbnail_url = fields.thumbnail;
            input.youtube_channel_url = fields.channel;
            input.display_order = fields.order;

            let id = catalog.create(input).await?;
            println!("Created video {}", id);
            Ok(())
        }
        Commands::Edit {
            id,
            title,
            video,
            fields,
        } => {
            let patch = VideoPatch {
                title,
                youtube_video_id: video,
                description: fields.description,
                category: fields.category,
                tags: fields.tags.as_deref().map(split_tags),
                thumbnail_url: fields.thumbnail,
                youtube_channel_url: fields.channel,
                display_order: fields.order,
                ..VideoPatch::default()
            };

            if patch.is_empty() {
                anyhow::bail!("Nothing to update. Pass at least one field to change.");
            }

            catalog.update(&DocumentId::from(id.as_str()), patch).await?;
            println!("Updated video {}", id);
            Ok(())
        }
        Commands::Rm { id } => {
            catalog.delete(&DocumentId::from(id.as_str())).await?;
            println!("Deleted video {}", id);
            Ok(())
        }
        Commands::Publish { id } => {
            catalog.set_published(&DocumentId::from(id.as_str()), true).await?;
            println!("Published {}", id);
            Ok(())
        }
        Commands::Unpublish { id } => {
            catalog.set_published(&DocumentId::from(id.as_str()), false).await?;
            println!("Unpublished {}", id);
            Ok(())
        }
        Commands::Feature { id } => {
            catalog.set_featured(&DocumentId::from(id.as_str()), true).await?;
            println!("Featured {}", id);
            Ok(())
        }
        Commands::Unfeature { id } => {
            catalog.set_featured(&DocumentId::from(id.as_str()), false).await?;
            println!("Unfeatured {}", id);
            Ok(())
        }
        Commands::Categories => {
            let categories = catalog.list_categories().await?;
            if categories.is_empty() {
                println!("No categories.");
            }
            for category in categories {
                println!("{}", category);
            }
            Ok(())
        }
        Commands::Parse { input, quality } => parse_input(&input, &quality),
        Commands::Config => show_config(),
    }
}

fn print_videos(videos: &[VideoEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(videos)?);
        return Ok(());
    }

    if videos.is_empty() {
        println!("No videos. Use 'showreel add <url> --title <title>' to add one.");
        return Ok(());
    }

    println!(
        "{:<34} {:>5} {:<3} {:<3} {:<13} {:<40}",
        "ID", "ORDER", "PUB", "FT", "VIDEO", "TITLE"
    );
    println!("{}", "-".repeat(104));

    for video in videos {
        let title = if video.title.chars().count() > 37 {
            format!("{}...", video.title.chars().take(37).collect::<String>())
        } else {
            video.title.clone()
        };
        println!(
            "{:<34} {:>5} {:<3} {:<3} {:<13} {:<40}",
            video.id.as_str(),
            video.display_order,
            if video.is_published { "yes" } else { "no" },
            if video.is_featured { "yes" } else { "no" },
            video.youtube_video_id.as_str(),
            title
        );
    }

    println!("\nTotal: {} videos", videos.len());
    Ok(())
}

fn print_video(video: &VideoEntry) {
    println!("ID:          {}", video.id);
    println!("Title:       {}", video.title);
    if !video.description.is_empty() {
        println!("Description: {}", video.description);
    }
    println!("Video:       {}", video.watch_url());
    println!("Embed:       {}", video.embed_url());
    if let Some(channel) = &video.youtube_channel_url {
        println!("Channel:     {}", channel);
    }
    println!("Category:    {}", video.category().unwrap_or("-"));
    if !video.tags.is_empty() {
        println!("Tags:        {}", video.tags.join(", "));
    }
    println!("Thumbnail:   {}", video.thumbnail_url.as_deref().unwrap_or("-"));
    println!("Published:   {}", video.is_published);
    println!("Featured:    {}", video.is_featured);
    println!("Order:       {}", video.display_order);
    println!("Created:     {}", video.created_at);
    println!("Updated:     {}", video.updated_at);
}

fn parse_input(input: &str, quality: &str) -> Result<()> {
    let id = youtube::extract_id(input)
        .filter(|id| youtube::is_valid_id(id))
        .with_context(|| format!("Not a YouTube URL or video id: {}", input))?;

    println!("Video id:  {}", id);
    println!("Thumbnail: {}", youtube::thumbnail_url(&id, quality));
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("Showreel configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Store:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Backend:  {}", cfg.backend);
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Catalog:");
    println!("  Collection:        {}", cfg.catalog.collection);
    println!("  Featured limit:    {}", cfg.catalog.featured_limit);
    println!("  Thumbnail quality: {}", cfg.catalog.thumbnail_quality);

    Ok(())
}
