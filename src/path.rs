//! Hierarchical key paths and the resolver that walks them through a [`Document`].
use std::fmt;

use serde::{Serialize, Serializer};

use crate::mutator::PathError;
use crate::value::{Document, Map, Value};

/// An ordered, non-empty list of object field names.
///
/// A path of length 1 addresses a field of the document root, longer paths descend through
/// nested objects one segment at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// builds a path from `segments`, returns `None` if there are no segments
    pub fn new<I, S>(segments: I) -> Option<KeyPath>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            None
        } else {
            Some(KeyPath { segments })
        }
    }

    /// a single segment path addressing a root level field
    pub fn single(key: impl Into<String>) -> KeyPath {
        KeyPath {
            segments: vec![key.into()],
        }
    }

    /// all segments, in order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// the number of segments, never zero
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// always false, a key path has at least one segment
    pub fn is_empty(&self) -> bool {
        false
    }

    /// splits the path into the segments leading to the parent object and the final segment
    pub fn split_last(&self) -> (&[String], &str) {
        match self.segments.split_last() {
            Some((last, parents)) => (parents, last.as_str()),
            // `new` and `single` never build an empty path
            None => (&[], ""),
        }
    }
}

impl From<&str> for KeyPath {
    fn from(key: &str) -> Self {
        KeyPath::single(key)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// a single segment is written as a plain string, a compound key as an array
impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.segments.as_slice() {
            [only] => serializer.serialize_str(only),
            segments => segments.serialize(serializer),
        }
    }
}

/// Finds the value addressed by `path` within `doc`.
///
/// Every segment but the last must name an existing object; there is no traversal into
/// arrays or scalars. Returns `None` if any segment is missing or an intermediate value is
/// not an object.
pub fn resolve<'a>(path: &KeyPath, doc: &'a Document) -> Option<&'a Value> {
    let (parents, last) = path.split_last();
    let mut current = doc.root();
    for segment in parents {
        match current.get(segment.as_str()) {
            Some(Value::Object(child)) => current = child,
            _ => return None,
        }
    }
    current.get(last)
}

/// Finds the object that holds the final segment of `path`, the document root for a single
/// segment path.
///
/// # Errors
/// [`PathError::LocationNotFound`] if the parent path does not resolve, and
/// [`PathError::LocationNotObject`] if it resolves to something other than an object
pub(crate) fn resolve_parent_mut<'a>(
    path: &KeyPath,
    doc: &'a mut Document,
) -> Result<&'a mut Map<String, Value>, PathError> {
    let (parents, _) = path.split_last();
    let mut current = doc.root_mut();
    for (i, segment) in parents.iter().enumerate() {
        let is_parent = i + 1 == parents.len();
        current = match current.get_mut(segment.as_str()) {
            Some(Value::Object(child)) => child,
            Some(_) if is_parent => return Err(PathError::LocationNotObject),
            _ => return Err(PathError::LocationNotFound),
        };
    }
    Ok(current)
}
