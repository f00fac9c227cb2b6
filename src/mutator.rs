//! Set and delete operations on a [`Document`].
//!
//! Neither operation creates missing intermediate objects. A client that wants to write
//! `["a", "b"]` must first set `"a"` to an object.
use thiserror::Error;
use tracing::trace;

use crate::path::{resolve_parent_mut, KeyPath};
use crate::value::{Document, Value};

/// The ways a key path can fail to address a location for mutation.
///
/// The messages are sent verbatim to clients as the `reason` of an `ERROR` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// the parent path of the key does not exist
    #[error("Element location not found.")]
    LocationNotFound,

    /// the parent path of the key exists but is not an object
    #[error("Element location is not a JsonObject.")]
    LocationNotObject,

    /// the final segment of the key is not present in its parent
    #[error("Key not found.")]
    KeyNotFound,
}

/// Sets the field addressed by `path` to `value`, replacing whatever was there.
///
/// # Errors
/// [`PathError::LocationNotFound`] or [`PathError::LocationNotObject`] if the parent of the
/// final segment cannot be written to. `doc` is untouched on error.
pub fn set(path: &KeyPath, value: Value, doc: &mut Document) -> Result<(), PathError> {
    let parent = resolve_parent_mut(path, doc)?;
    let (_, last) = path.split_last();
    trace!(key = %path, "setting field");
    // a replaced field moves to the end, like a newly added one
    parent.shift_remove(last);
    parent.insert(last.to_string(), value);
    Ok(())
}

/// Removes the field addressed by `path`. The remaining fields keep their order.
///
/// # Errors
/// the parent errors of [`set`], plus [`PathError::KeyNotFound`] if the final segment does
/// not exist. `doc` is untouched on error.
pub fn delete(path: &KeyPath, doc: &mut Document) -> Result<(), PathError> {
    let parent = resolve_parent_mut(path, doc)?;
    let (_, last) = path.split_last();
    trace!(key = %path, "deleting field");
    parent
        .shift_remove(last)
        .map(|_| ())
        .ok_or(PathError::KeyNotFound)
}
