#![deny(missing_docs)]
//! A multithreaded, networked store for a single JSON document, addressed by hierarchical keys.
//!
//! This crate provides the [`JsonStore`] engine itself, as well as a [`jsondb-client`]
//! and [`jsondb-server`] executable that can be used to interact with it.
//! Requests and responses are JSON texts sent between the client and server using synchronous
//! networking, one request per connection.
//!
//! ## Supported Operations
//! The server supports four types of requests (a.k.a "commands"):
//!
//! - `set` a JSON value at a key
//! - `get` the JSON value at a key
//! - `delete` a key and its value
//! - `exit` to stop the server from accepting new connections
//!
//! A key is either a single field name of the root object, or an array of field names that
//! descends through nested objects: `["person", "rocket", "launches"]`. Every field but the
//! last must already exist as an object; nothing is created on the way down.
//!
//! See the [`JsonDbEngine`] trait and the [`Request`] and [`Response`] types for more
//! information on the structure of these operations.
//!
//! ## JsonStore
//! [`JsonStore`] is the implementor of the [`JsonDbEngine`] trait.
//! It is responsible for the following tasks:
//! - processing the set, get and delete operations
//! - keeping the document in a single JSON file, created as `{}` if missing
//! - guarding that file with a fair reader/writer lock: gets run side by side, sets and
//! deletes run one at a time
//!
//! There is no in-memory copy of the document between requests. Every operation reads the
//! whole file, and every mutation writes the whole file back. This keeps the file and the lock
//! the only shared state at the cost of a full read (and write) per request.
//!
//! ## Client / Server
//! Client and server logic is contained in the [`client`] and [`server`] structs. They are
//! responsible for the networking portion of this application. The server hands each
//! connection to a bounded [`ThreadPool`] and stops after answering an `exit` request.
//!
//! ## Protocol
//! Each message is one frame: a 2 byte big-endian length followed by the message encoded as
//! Java style "modified UTF-8" (see [`frame`]). A request looks like
//! `{"type":"set","key":["a","b"],"value":{"c":1}}`, a response like
//! `{"response":"OK","value":...}` or `{"response":"ERROR","reason":"No such key"}`.
//! A request that cannot be parsed gets a bare `{"response":"ERROR"}`.
//!
//! [`client`]: ./struct.JsonDbClient.html
//! [`server`]: ./struct.JsonDbServer.html
//! [`jsondb-server`]: ./jsondb-server.rs
//! [`jsondb-client`]: ./jsondb-client.rs

pub use client::JsonDbClient;
pub use command::{Request, Response, Status};
pub use dispatcher::{Dispatched, Dispatcher, NO_SUCH_KEY};
pub use engine::{JsonDbEngine, JsonStore};
pub use error::{JsonDbError, Result};
pub use mutator::PathError;
pub use path::KeyPath;
pub use server::{JsonDbServer, ShutdownHandle};
pub use thread_pool::{RayonThreadPool, SharedQueueThreadPool, ThreadPool};
pub use value::{Document, Value};

mod client;
mod command;
mod dispatcher;
mod engine;
mod error;
pub mod frame;
pub mod mutator;
pub mod path;
mod server;
pub mod thread_pool;
pub mod value;
