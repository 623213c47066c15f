//! Dataset cache storage keyed on a content fingerprint.
//!
//! Each source (a data directory or a single uploaded file) owns one JSON
//! entry under the cache directory, named after the MD5 hash of its path.
//! The entry stores the fingerprint the value was built from; a lookup with
//! a different fingerprint deletes the entry and misses. The stored value is
//! usually a [`Dataset`](crate::record::Dataset) plus whatever the caller
//! needs to report about how it was read.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error type for cache operations
#[derive(Debug)]
pub enum CacheError {
    IoError(String),
    CorruptEntry(String),
    SerializeError(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::IoError(msg) => write!(f, "IO error: {}", msg),
            CacheError::CorruptEntry(path) => write!(f, "Corrupt cache entry: {}", path),
            CacheError::SerializeError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::IoError(err.to_string())
    }
}

/// One file of a directory listing, as used for fingerprinting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch.
    pub modified: u128,
}

/// MD5 hex digest identifying one version of a source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a single file's contents.
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(bytes)))
    }

    /// Fingerprint of a directory listing. Entry order does not matter.
    pub fn of_listing(entries: &[ListingEntry]) -> Self {
        let mut sorted: Vec<&ListingEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut text = String::new();
        for entry in sorted {
            text.push_str(&format!("{}\t{}\t{}\n", entry.name, entry.size, entry.modified));
        }
        Self(format!("{:x}", md5::compute(text.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    fingerprint: Fingerprint,
    value: T,
}

/// Filesystem-backed cache of values derived from a source.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the entry belonging to `source`.
    pub fn entry_path(&self, source: &Path) -> PathBuf {
        let key = format!("{:x}", md5::compute(source.to_string_lossy().as_bytes()));
        self.dir.join(format!("{key}.json"))
    }

    /// Return the cached value for `source` if it was built from
    /// `fingerprint`.
    ///
    /// A stale entry is removed. An unreadable entry is removed as well and
    /// reported as [`CacheError::CorruptEntry`].
    pub fn load<T: DeserializeOwned>(
        &self,
        source: &Path,
        fingerprint: &Fingerprint,
    ) -> Result<Option<T>, CacheError> {
        let path = self.entry_path(source);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(_) => {
                fs::remove_file(&path)?;
                return Err(CacheError::CorruptEntry(path.display().to_string()));
            }
        };

        if entry.fingerprint != *fingerprint {
            log::debug!(
                "Cache entry for {} is stale ({} != {})",
                source.display(),
                entry.fingerprint.as_str(),
                fingerprint.as_str()
            );
            fs::remove_file(&path)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    /// Store `value` for `source`, replacing any previous entry.
    pub fn save<T: Serialize>(
        &self,
        source: &Path,
        fingerprint: &Fingerprint,
        value: &T,
    ) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;

        let entry = CacheEntry {
            fingerprint: fingerprint.clone(),
            value,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| CacheError::SerializeError(e.to_string()))?;
        fs::write(self.entry_path(source), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attribute, CanonicalRecord, Column, Dataset};
    use tempfile::TempDir;

    fn dataset() -> Dataset {
        Dataset {
            columns: vec![Column::Canonical(Attribute::Gender)],
            records: vec![CanonicalRecord {
                gender: Some("Feminino".to_string()),
                ..Default::default()
            }],
        }
    }

    fn listing(modified: u128) -> Vec<ListingEntry> {
        vec![
            ListingEntry {
                name: "b.pdf".to_string(),
                size: 10,
                modified,
            },
            ListingEntry {
                name: "a.csv".to_string(),
                size: 20,
                modified: 1,
            },
        ]
    }

    #[test]
    fn test_fingerprint_of_bytes() {
        let a = Fingerprint::of_bytes(b"sexo;idade\nF;30\n");
        let b = Fingerprint::of_bytes(b"sexo;idade\nF;30\n");
        let c = Fingerprint::of_bytes(b"sexo;idade\nF;31\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_fingerprint_of_listing_ignores_order() {
        let mut reversed = listing(5);
        reversed.reverse();
        assert_eq!(Fingerprint::of_listing(&listing(5)), Fingerprint::of_listing(&reversed));
        assert_ne!(Fingerprint::of_listing(&listing(5)), Fingerprint::of_listing(&listing(6)));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path().join("cache"));
        let source = Path::new("/data/perfil");
        let fingerprint = Fingerprint::of_listing(&listing(1));

        assert_eq!(store.load::<Dataset>(source, &fingerprint).unwrap(), None);

        store.save(source, &fingerprint, &dataset()).unwrap();
        assert_eq!(store.load::<Dataset>(source, &fingerprint).unwrap(), Some(dataset()));
    }

    #[test]
    fn test_stale_entry_is_removed() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());
        let source = Path::new("/data/perfil");

        store
            .save(source, &Fingerprint::of_listing(&listing(1)), &dataset())
            .unwrap();
        let changed = Fingerprint::of_listing(&listing(2));
        assert_eq!(store.load::<Dataset>(source, &changed).unwrap(), None);
        assert!(!store.entry_path(source).exists());
    }

    #[test]
    fn test_sources_do_not_collide() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());
        let fingerprint = Fingerprint::of_bytes(b"x");

        store.save(Path::new("/a"), &fingerprint, &dataset()).unwrap();
        assert_eq!(store.load::<Dataset>(Path::new("/b"), &fingerprint).unwrap(), None);
        assert_ne!(store.entry_path(Path::new("/a")), store.entry_path(Path::new("/b")));
    }

    #[test]
    fn test_corrupt_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());
        let source = Path::new("/data/perfil");
        fs::write(store.entry_path(source), "not json").unwrap();

        let result = store.load::<Dataset>(source, &Fingerprint::of_bytes(b"x"));
        assert!(matches!(result, Err(CacheError::CorruptEntry(_))));
        assert!(!store.entry_path(source).exists());
    }
}
