//! JSON list files backing the admin and keyword stores.
//!
//! Each file is a full snapshot of one collection, rewritten on every
//! change. Non-ASCII text (the default keywords are Arabic) is stored
//! verbatim as UTF-8.

use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading or writing a list file.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A JSON file holding a flat list of `T`.
#[derive(Debug, Clone)]
pub struct ListFile<T> {
    path: PathBuf,
    _items: PhantomData<fn() -> T>,
}

impl<T> ListFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a handle for the list stored at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _items: PhantomData,
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the list, returning `None` when the file does not exist.
    pub fn load(&self) -> Result<Option<Vec<T>>, PersistError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    /// Rewrites the whole file with `items`.
    pub fn save(&self, items: &[T]) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(items).map_err(|source| PersistError::Encode {
            path: self.path.clone(),
            source,
        })?;

        std::fs::write(&self.path, json).map_err(|source| PersistError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), count = items.len(), "Saved list file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let file: ListFile<i64> = ListFile::new(dir.path().join("admins.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_keyword_order_survives_reload() {
        let dir = tempdir().unwrap();
        let file: ListFile<String> = ListFile::new(dir.path().join("keywords.json"));
        let keywords = vec!["حصري".to_owned(), "Sale".to_owned(), "عاجل".to_owned()];

        file.save(&keywords).unwrap();

        assert_eq!(file.load().unwrap(), Some(keywords));
        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("حصري"), "non-ASCII must be stored verbatim");
    }

    #[test]
    fn test_admin_ids_survive_reload() {
        let dir = tempdir().unwrap();
        let file: ListFile<i64> = ListFile::new(dir.path().join("admins.json"));

        file.save(&[42, 7, 1_000_000_001]).unwrap();

        assert_eq!(file.load().unwrap(), Some(vec![42, 7, 1_000_000_001]));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admins.json");
        std::fs::write(&path, "not json").unwrap();

        let file: ListFile<i64> = ListFile::new(path);
        assert!(matches!(file.load(), Err(PersistError::Parse { .. })));
    }
}
