//! Drawings stored as `<name>.json` files in one directory.

use super::{BoxFuture, Storage, StorageError, StorageResult, decode, encode, validate_name};
use crate::document::Document;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a drawing directory.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|source| StorageError::Io {
            path: base_path.clone(),
            source,
        })?;
        Ok(Self { base_path })
    }

    /// The per-user drawing directory.
    ///
    /// On Linux: `~/.local/share/inkboard/drawings/`
    /// On Windows: `%LOCALAPPDATA%\inkboard\drawings\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io {
                path: PathBuf::from("~"),
                source: std::io::Error::new(ErrorKind::NotFound, "no home directory"),
            })?;
        Self::new(base.join("inkboard").join("drawings"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Where the drawing `id` lives.
    pub fn drawing_path(&self, id: &str) -> StorageResult<PathBuf> {
        let id = validate_name(id)?;
        Ok(self.base_path.join(format!("{id}.{EXTENSION}")))
    }

    fn save_now(&self, id: &str, document: &Document) -> StorageResult<()> {
        let path = self.drawing_path(id)?;
        let bytes = encode(document)?;

        // Write beside the target, then rename over it, so a failed save
        // never truncates the previous version.
        let staging = path.with_extension(format!("{EXTENSION}.partial"));
        fs::write(&staging, &bytes).map_err(|source| StorageError::Io {
            path: staging.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(StorageError::Io { path, source });
        }
        log::debug!(
            "Saved drawing {id:?} ({} elements) to {}",
            document.len(),
            path.display()
        );
        Ok(())
    }

    fn load_now(&self, id: &str) -> StorageResult<Document> {
        let path = self.drawing_path(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        decode(id, &bytes)
    }

    fn delete_now(&self, id: &str) -> StorageResult<()> {
        let path = self.drawing_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Deleted drawing {id:?}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn list_now(&self) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(&self.base_path).map_err(|source| StorageError::Io {
            path: self.base_path.clone(),
            source,
        })?;

        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == EXTENSION))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .filter(|id| validate_name(id).is_ok())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.save_now(id, document);
        Box::pin(async move { result })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let result = self.load_now(id);
        Box::pin(async move { result })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.delete_now(id);
        Box::pin(async move { result })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let result = self.list_now();
        Box::pin(async move { result })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let result = self.drawing_path(id).map(|path| path.is_file());
        Box::pin(async move { result })
    }
}
