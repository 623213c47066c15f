//! Cached ingestion: source → normalized dataset.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use log::{debug, info, warn};
use perfiladv_core::cache::{CacheStore, Fingerprint, ListingEntry};
use perfiladv_core::record::Dataset;
use perfiladv_core::schema::normalize_table;
use serde::{Deserialize, Serialize};

use crate::{ingest_dir, ingest_file, IngestError, SkippedFile, SkippedPage, SourceFormat};

/// Where the survey comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A data directory, searched with CSV > spreadsheet > PDF precedence.
    Dir(PathBuf),
    /// A single uploaded file.
    File(PathBuf),
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Source::Dir(path) | Source::File(path) => path,
        }
    }

    /// Identity of the source in the cache.
    fn cache_key(&self) -> PathBuf {
        fs::canonicalize(self.path()).unwrap_or_else(|_| self.path().to_path_buf())
    }

    /// Fingerprint of the current contents: the file bytes, or the
    /// directory listing.
    pub fn fingerprint(&self) -> Result<Fingerprint, IngestError> {
        let io_error = |source: std::io::Error| IngestError::Io {
            path: self.path().to_path_buf(),
            source,
        };

        match self {
            Source::File(path) => Ok(Fingerprint::of_bytes(&fs::read(path).map_err(io_error)?)),
            Source::Dir(dir) => {
                let mut entries = Vec::new();
                for entry in fs::read_dir(dir).map_err(io_error)? {
                    let entry = entry.map_err(io_error)?;
                    let metadata = entry.metadata().map_err(io_error)?;
                    if !metadata.is_file() {
                        continue;
                    }
                    let modified = metadata
                        .modified()
                        .ok()
                        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                        .map(|elapsed| elapsed.as_nanos())
                        .unwrap_or(0);
                    entries.push(ListingEntry {
                        name: entry.file_name().to_string_lossy().into_owned(),
                        size: metadata.len(),
                        modified,
                    });
                }
                Ok(Fingerprint::of_listing(&entries))
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Directory holding cache entries. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_cache(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(dir.into()),
        }
    }

    pub fn without_cache() -> Self {
        Self { cache_dir: None }
    }
}

/// A normalized dataset and how it was obtained.
///
/// The whole value is what gets cached, so a partial ingestion stays partial
/// when it is served from the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loaded {
    pub dataset: Dataset,
    #[serde(skip)]
    pub from_cache: bool,
    pub format: SourceFormat,
    pub sources: Vec<PathBuf>,
    pub skipped_pages: Vec<SkippedPage>,
    pub skipped_files: Vec<SkippedFile>,
}

impl Loaded {
    pub fn is_partial(&self) -> bool {
        !self.skipped_pages.is_empty() || !self.skipped_files.is_empty()
    }
}

/// Ingest and normalize `source`, reusing a cached dataset when the source
/// has not changed since it was stored.
///
/// Cache failures are logged and otherwise ignored.
pub fn load_dataset(source: &Source, options: &LoadOptions) -> Result<Loaded, IngestError> {
    let cache = options.cache_dir.as_ref().map(CacheStore::new);
    let key = source.cache_key();

    let fingerprint = match &cache {
        Some(_) => match source.fingerprint() {
            Ok(fingerprint) => Some(fingerprint),
            Err(e) => {
                warn!("Cannot fingerprint {}: {e}", source.path().display());
                None
            }
        },
        None => None,
    };

    if let (Some(store), Some(fingerprint)) = (&cache, &fingerprint) {
        match store.load::<Loaded>(&key, fingerprint) {
            Ok(Some(cached)) => {
                let loaded = Loaded {
                    from_cache: true,
                    ..cached
                };
                info!(
                    "Loaded {} records for {} from cache",
                    loaded.dataset.len(),
                    source.path().display()
                );
                return Ok(loaded);
            }
            Ok(None) => debug!("Cache miss for {}", source.path().display()),
            Err(e) => warn!("Ignoring cache entry for {}: {e}", source.path().display()),
        }
    }

    let ingested = match source {
        Source::Dir(dir) => ingest_dir(dir)?,
        Source::File(path) => ingest_file(path)?,
    };
    let dataset = normalize_table(&ingested.table);
    info!(
        "Normalized {} records with {} columns from {}",
        dataset.len(),
        dataset.columns.len(),
        ingested.format
    );

    let loaded = Loaded {
        dataset,
        from_cache: false,
        format: ingested.format,
        sources: ingested.sources,
        skipped_pages: ingested.skipped_pages,
        skipped_files: ingested.skipped_files,
    };

    if let (Some(store), Some(fingerprint)) = (&cache, &fingerprint) {
        if let Err(e) = store.save(&key, fingerprint, &loaded) {
            warn!("Failed to cache {}: {e}", source.path().display());
        }
    }

    Ok(loaded)
}
