use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::crate_version;
use parking_lot::RwLock;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use super::JsonDbEngine;
use crate::error::Result;
use crate::mutator;
use crate::path::{resolve, KeyPath};
use crate::value::{Document, Value};

/// The primary struct for working with a JSON document store.
///
/// The document lives in a single file on the local file system. There is no cached copy:
/// every operation reads the file under the lock, and `set`/`delete` write the whole
/// document back before the lock is released. Gets share the lock, mutations hold it
/// exclusively. The lock is task-fair, so neither readers nor writers starve.
///
/// Clones share the same file and lock.
#[derive(Debug, Clone)]
pub struct JsonStore {
    // path of the file holding the serialized document
    path: Arc<PathBuf>,

    // guards every access to the file
    lock: Arc<RwLock<()>>,
}

impl JsonStore {
    /// creates a [`JsonStore`] backed by the file at `path`.
    ///
    /// Missing parent directories are created, and a missing file is initialized to `{}`.
    /// An existing file is left untouched, even if it does not hold a valid document; such a
    /// file makes each operation fail until it is repaired.
    #[instrument]
    pub fn open(path: &Path) -> Result<JsonStore> {
        info!("opening jsondb engine version {}", crate_version!());
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        if !path.exists() {
            debug!("initializing empty document at {:?}", path);
            fs::write(path, Document::new().to_json()?)?;
        }

        Ok(JsonStore {
            path: Arc::new(path.to_path_buf()),
            lock: Arc::new(RwLock::new(())),
        })
    }

    /// path of the backing document file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// reads the document from disk. A file that has gone missing reads as `{}`.
    /// Must only be called while holding the lock.
    fn load(&self) -> Result<Document> {
        match fs::read_to_string(self.path.as_path()) {
            Ok(text) => Document::from_json(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// rewrites the whole document file. Must only be called while holding the write lock.
    ///
    /// The document is written to a temporary file in the same directory, which is then
    /// renamed over the target. A crash mid-write leaves the previous document in place.
    fn persist(&self, doc: &Document) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(doc.to_json()?.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path.as_path()).map_err(io::Error::from)?;
        Ok(())
    }
}

impl JsonDbEngine for JsonStore {
    /// sets `key` to `value` and persists the document
    #[instrument(skip(self, key, value), fields(key = %key))]
    fn set(&self, key: &KeyPath, value: Value) -> Result<()> {
        let _guard = self.lock.write();
        let mut doc = self.load()?;
        debug!("before set: {}", doc);

        mutator::set(key, value, &mut doc)?;
        self.persist(&doc)?;

        debug!("after set: {}", doc);
        Ok(())
    }

    /// reads the value at `key`, `Ok(None)` if the key path does not resolve
    #[instrument(skip(self, key), fields(key = %key))]
    fn get(&self, key: &KeyPath) -> Result<Option<Value>> {
        let _guard = self.lock.read();
        let doc = self.load()?;
        debug!("get from: {}", doc);

        Ok(resolve(key, &doc).cloned())
    }

    /// removes `key` and persists the document
    ///
    /// # Errors
    /// returns `PathError::KeyNotFound` if `key` was not in the document
    #[instrument(skip(self, key), fields(key = %key))]
    fn delete(&self, key: &KeyPath) -> Result<()> {
        let _guard = self.lock.write();
        let mut doc = self.load()?;
        debug!("before delete: {}", doc);

        mutator::delete(key, &mut doc)?;
        self.persist(&doc)?;

        debug!("after delete: {}", doc);
        Ok(())
    }
}
