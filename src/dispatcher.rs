use tracing::{debug, warn};

use crate::command::{Request, Response};
use crate::engine::JsonDbEngine;
use crate::error::JsonDbError;

/// reason sent when a get does not find its key
pub const NO_SUCH_KEY: &str = "No such key";

/// The result of dispatching one request: the response to send back, and whether the
/// server should stop accepting new connections once it has been sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// the response for the client
    pub response: Response,
    /// true after an exit request
    pub stop: bool,
}

impl From<Response> for Dispatched {
    fn from(response: Response) -> Self {
        Dispatched {
            response,
            stop: false,
        }
    }
}

/// Turns raw request strings into responses by running them against a [`JsonDbEngine`].
///
/// A dispatcher keeps no state between requests. Every failure is turned into an `ERROR`
/// response, nothing is returned as an `Err`.
#[derive(Debug, Clone)]
pub struct Dispatcher<E: JsonDbEngine> {
    engine: E,
}

impl<E: JsonDbEngine> Dispatcher<E> {
    /// create a dispatcher over `engine`
    pub fn new(engine: E) -> Self {
        Dispatcher { engine }
    }

    /// decodes `raw`, executes it and encodes the outcome
    pub fn dispatch(&self, raw: &str) -> Dispatched {
        match Request::parse(raw) {
            Ok(req) => self.execute(req),
            Err(e) => {
                // the caller is not told why its request was rejected
                debug!("rejecting request: {}", e);
                Response::error().into()
            }
        }
    }

    /// executes an already decoded request
    pub fn execute(&self, req: Request) -> Dispatched {
        match req {
            Request::Set { key, value } => match self.engine.set(&key, value) {
                Ok(()) => Response::ok().into(),
                Err(e) => failed(e).into(),
            },
            Request::Get { key } => match self.engine.get(&key) {
                Ok(Some(value)) => Response::ok_with(value).into(),
                Ok(None) => Response::error_with(NO_SUCH_KEY).into(),
                Err(e) => failed(e).into(),
            },
            Request::Delete { key } => match self.engine.delete(&key) {
                Ok(()) => Response::ok().into(),
                Err(e) => failed(e).into(),
            },
            Request::Exit => Dispatched {
                response: Response::ok(),
                stop: true,
            },
        }
    }
}

fn failed(e: JsonDbError) -> Response {
    if !matches!(e, JsonDbError::Path(_)) {
        warn!("storage failure: {}", e);
    }
    Response::error_with(e.to_string())
}
