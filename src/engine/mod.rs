//! This module provides the storage engine behind the server.
//! [`JsonStore`] keeps the whole document in a single JSON file and guards it with a fair
//! reader/writer lock.
use crate::path::KeyPath;
use crate::value::Value;
use crate::Result;

/// A trait for the basic functionality of a JSON document storage engine.
///
/// Engines are cheap handles: every connection gets its own clone and all clones operate on
/// the same document.
pub trait JsonDbEngine: Clone + Send + 'static {
    /// sets the field at `key` to `value`
    ///
    /// If the field already exists its previous value is replaced.
    ///
    /// # Errors
    /// [`PathError`] if the parent of `key` does not exist or is not an object, or a storage
    /// error if the document could not be read or written.
    ///
    /// [`PathError`]: ../mutator/enum.PathError.html
    fn set(&self, key: &KeyPath, value: Value) -> Result<()>;

    /// Gets the value at `key`
    ///
    /// Returns `None` if the key path does not resolve.
    fn get(&self, key: &KeyPath) -> Result<Option<Value>>;

    /// Removes the field at `key` (and its value) from the document
    ///
    /// # Errors
    ///
    /// Returns `PathError::KeyNotFound` if the field is not present.
    fn delete(&self, key: &KeyPath) -> Result<()>;
}

mod store;

pub use self::store::JsonStore;
