use std::io;
use thiserror::Error;

use crate::mutator::PathError;

/// type alias for all operations on a [`JsonStore`] that could fail with a [`JsonDbError`]
///
/// [`JsonStore`]: ./struct.JsonStore.html
pub type Result<T> = std::result::Result<T, JsonDbError>;

/// The Error variants used throughout jsondb.
///
/// The `Display` output of each variant is what ends up in the `reason` field of an
/// `ERROR` response, so it should read as a diagnostic on its own.
#[derive(Debug, Error)]
pub enum JsonDbError {
    /// errors caused by file or socket IO
    #[error("{0}")]
    Io(#[from] io::Error),

    /// errors while (de)serializing JSON, including a malformed document file
    #[error("{0}")]
    Serde(#[from] serde_json::Error),

    /// a key path could not be resolved or mutated
    #[error(transparent)]
    Path(#[from] PathError),

    /// a request or command line option could not be parsed
    #[error("{0}")]
    Parsing(String),

    /// a wire frame was malformed or too large to encode
    #[error("invalid frame: {0}")]
    Frame(String),

    /// the document file held valid JSON whose root is not an object
    #[error("document root is not a JSON object")]
    NotAnObject,

    /// general purpose error carrying a message, typically one received from the server
    #[error("{0}")]
    StringErr(String),
}
