use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{JsonDbError, Result};
use crate::path::KeyPath;
use crate::value::Value;

/// These are the request "commands" that can be made to a jsondb server
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// set a field in the document
    Set {
        /// the key path to set
        key: KeyPath,
        /// the value to set, any JSON
        value: Value,
    },
    /// get a value from the document
    Get {
        /// the key path to search for
        key: KeyPath,
    },
    /// remove a field from the document
    Delete {
        /// the key path to remove
        key: KeyPath,
    },
    /// ask the server to stop accepting connections
    Exit,
}

/// Request kinds, each knowing how many input fields it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Set,
    Get,
    Delete,
    Exit,
}

impl Kind {
    const ALL: [Kind; 4] = [Kind::Set, Kind::Get, Kind::Delete, Kind::Exit];

    fn name(self) -> &'static str {
        match self {
            Kind::Set => "set",
            Kind::Get => "get",
            Kind::Delete => "delete",
            Kind::Exit => "exit",
        }
    }

    // number of input fields: key for 1 and above, value for 2
    fn arity(self) -> usize {
        match self {
            Kind::Set => 2,
            Kind::Get | Kind::Delete => 1,
            Kind::Exit => 0,
        }
    }

    fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl Request {
    /// parses a raw request string into a [`Request`].
    ///
    /// The request must be a JSON object with a `type` field naming one of `set`, `get`,
    /// `delete` or `exit` (case-insensitively). `set`, `get` and `delete` also need a `key`,
    /// either a string or a non-empty array of strings, and `set` needs a `value`.
    ///
    /// # Errors
    /// returns [`JsonDbError::Parsing`] if any of the above does not hold
    pub fn parse(raw: &str) -> Result<Request> {
        let mut fields = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(parsing("request is not a JSON object")),
            Err(e) => return Err(parsing(&format!("request is not valid JSON: {}", e))),
        };

        let kind = match fields.get("type") {
            Some(Value::String(name)) => Kind::from_name(name)
                .ok_or_else(|| parsing(&format!("unknown request type: {}", name)))?,
            Some(_) => return Err(parsing("request type is not a string")),
            None => return Err(parsing("request has no type")),
        };

        if kind.arity() == 0 {
            return Ok(Request::Exit);
        }

        let key = match fields.get("key") {
            Some(key) => parse_key(key)?,
            None => return Err(parsing("request has no key")),
        };

        match kind {
            Kind::Get => Ok(Request::Get { key }),
            Kind::Delete => Ok(Request::Delete { key }),
            _ => {
                let value = fields
                    .remove("value")
                    .ok_or_else(|| parsing("request has no value"))?;
                Ok(Request::Set { key, value })
            }
        }
    }

    /// serializes this request into the JSON text sent on the wire
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn kind(&self) -> Kind {
        match self {
            Request::Set { .. } => Kind::Set,
            Request::Get { .. } => Kind::Get,
            Request::Delete { .. } => Kind::Delete,
            Request::Exit => Kind::Exit,
        }
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind().name())?;
        match self {
            Request::Set { key, value } => {
                map.serialize_entry("key", key)?;
                map.serialize_entry("value", value)?;
            }
            Request::Get { key } | Request::Delete { key } => {
                map.serialize_entry("key", key)?;
            }
            Request::Exit => {}
        }
        map.end()
    }
}

fn parse_key(key: &Value) -> Result<KeyPath> {
    match key {
        Value::String(segment) => Ok(KeyPath::single(segment.as_str())),
        Value::Array(items) => {
            let segments = items
                .iter()
                .map(|item| match item {
                    Value::String(segment) => Ok(segment.clone()),
                    _ => Err(parsing("key segments must be strings")),
                })
                .collect::<Result<Vec<String>>>()?;
            KeyPath::new(segments).ok_or_else(|| parsing("key is an empty array"))
        }
        _ => Err(parsing("key must be a string or an array of strings")),
    }
}

fn parsing(msg: &str) -> JsonDbError {
    JsonDbError::Parsing(msg.to_string())
}

/// The outcome reported in every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// the request was carried out
    Ok,
    /// the request failed, or could not be parsed
    Error,
}

/// The response returned for any request
///
/// `reason` is only present on errors that carry a diagnostic; an unparseable request gets a
/// bare `{"response":"ERROR"}`. `value` is only present on a successful get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// whether the request succeeded
    pub response: Status,
    /// why the request failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// the value found by a get
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub value: Option<Value>,
}

impl Response {
    /// `{"response":"OK"}`
    pub fn ok() -> Self {
        Response {
            response: Status::Ok,
            reason: None,
            value: None,
        }
    }

    /// `{"response":"OK","value":...}`
    pub fn ok_with(value: Value) -> Self {
        Response {
            value: Some(value),
            ..Response::ok()
        }
    }

    /// `{"response":"ERROR"}`, with no reason
    pub fn error() -> Self {
        Response {
            response: Status::Error,
            reason: None,
            value: None,
        }
    }

    /// `{"response":"ERROR","reason":...}`
    pub fn error_with(reason: impl Into<String>) -> Self {
        Response {
            reason: Some(reason.into()),
            ..Response::error()
        }
    }

    /// parses a response received from a server
    pub fn parse(raw: &str) -> Result<Response> {
        Ok(serde_json::from_str(raw)?)
    }

    /// serializes this response into the JSON text sent on the wire
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// true if the request succeeded
    pub fn is_ok(&self) -> bool {
        self.response == Status::Ok
    }
}

// a `"value": null` that is present must stay distinguishable from a missing value
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
