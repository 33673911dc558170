//! Configuration for the showreel catalog.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SHOWREEL_HOME, SHOWREEL_STORE, SHOWREEL_DB)
//! 2. Config file (.showreel/config.yaml)
//! 3. Defaults (~/.showreel, sqlite store at ~/.showreel/catalog.db)
//!
//! Config file discovery:
//! - Searches current directory and parents for .showreel/config.yaml
//! - Paths in config file are relative to the .showreel/ directory

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::catalog::{VideoCatalog, DEFAULT_COLLECTION};
use crate::domain::youtube::DEFAULT_QUALITY;
use crate::store::{DocumentStore, MemoryStore, SqliteStore};

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Backend name (memory | sqlite)
    pub backend: Option<String>,
    /// SQLite database path (relative to .showreel/)
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub collection: Option<String>,
    pub featured_limit: Option<usize>,
    pub thumbnail_quality: Option<String>,
}

/// Which store implementation to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "sqlite" | "sqlite3" => Ok(StoreBackend::Sqlite),
            _ => anyhow::bail!("Unknown store backend: {}", s),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to showreel home
    pub home: PathBuf,
    /// Store backend
    pub backend: StoreBackend,
    /// SQLite database file
    pub database: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Catalog settings
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    pub collection: String,
    pub featured_limit: usize,
    pub thumbnail_quality: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            featured_limit: 6,
            thumbnail_quality: DEFAULT_QUALITY.to_string(),
        }
    }
}

impl CatalogSettings {
    fn from_file(config: Option<&CatalogConfig>) -> Self {
        let defaults = Self::default();
        let Some(config) = config else {
            return defaults;
        };

        Self {
            collection: config.collection.clone().unwrap_or(defaults.collection),
            featured_limit: config.featured_limit.unwrap_or(defaults.featured_limit),
            thumbnail_quality: config
                .thumbnail_quality
                .clone()
                .unwrap_or(defaults.thumbnail_quality),
        }
    }
}

impl ResolvedConfig {
    /// Open the configured store
    pub fn open_store(&self) -> Result<Arc<dyn DocumentStore>> {
        match self.backend {
            StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreBackend::Sqlite => {
                let store = SqliteStore::open(&self.database).with_context(|| {
                    format!("Failed to open database: {}", self.database.display())
                })?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Build a catalog over the configured store
    pub fn catalog(&self) -> Result<VideoCatalog> {
        Ok(VideoCatalog::new(self.open_store()?)
            .with_collection(&self.catalog.collection)
            .with_thumbnail_quality(&self.catalog.thumbnail_quality))
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".showreel").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to a base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".showreel");

    let config_file = find_config_file();
    let file = config_file
        .as_deref()
        .map(load_config_file)
        .transpose()?;

    // Relative paths in the file resolve against .showreel/
    let file_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));

    let home = std::env::var("SHOWREEL_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_home.clone());

    let backend = match std::env::var("SHOWREEL_STORE") {
        Ok(value) => value.parse()?,
        Err(_) => match file.as_ref().and_then(|f| f.store.backend.as_deref()) {
            Some(value) => value.parse()?,
            None => StoreBackend::Sqlite,
        },
    };

    let database = if let Ok(env_db) = std::env::var("SHOWREEL_DB") {
        PathBuf::from(env_db)
    } else if let Some(path) = file.as_ref().and_then(|f| f.store.path.as_deref()) {
        resolve_path(file_dir, path)
    } else {
        home.join("catalog.db")
    };

    let catalog = CatalogSettings::from_file(file.as_ref().and_then(|f| f.catalog.as_ref()));

    Ok(ResolvedConfig {
        home,
        backend,
        database,
        config_file,
        catalog,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
