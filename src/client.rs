use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::command::{Request, Response};
use crate::dispatcher::NO_SUCH_KEY;
use crate::frame::{read_frame, write_frame};
use crate::path::KeyPath;
use crate::value::Value;
use crate::{JsonDbError, Result};

/// `JsonDbClient` contains the functionality for communication with a [`JsonDbServer`]
///
/// The server answers exactly one request per connection, so every request method consumes
/// the client.
///
/// [`JsonDbServer`]: ./struct.JsonDbServer.html
pub struct JsonDbClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl JsonDbClient {
    /// creates a client and establishes a socket connection to the server at the given `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;

        Ok(JsonDbClient {
            reader: BufReader::new(tcp_reader),
            writer: BufWriter::new(tcp_writer),
        })
    }

    /// sends a raw request string and returns the raw response string
    pub fn send_raw(mut self, request: &str) -> Result<String> {
        write_frame(&mut self.writer, request)?;
        read_frame(&mut self.reader)
    }

    /// sends `req` and returns the server's [`Response`], whether `OK` or `ERROR`
    pub fn send(self, req: &Request) -> Result<Response> {
        let raw = self.send_raw(&req.to_json()?)?;
        Response::parse(&raw)
    }

    /// gets the value at `key` from the server
    /// ## Returns
    /// `Ok<Some<Value>>` if a value was found at the key.
    /// `Ok<None>` if the key does not exist
    /// `Err<JsonDbError::StringErr>` with the server's reason if the get failed
    pub fn get(self, key: KeyPath) -> Result<Option<Value>> {
        let resp = self.send(&Request::Get { key })?;
        if resp.is_ok() {
            return Ok(resp.value);
        }
        match resp.reason {
            Some(reason) if reason == NO_SUCH_KEY => Ok(None),
            reason => Err(remote(reason)),
        }
    }

    /// sends a set request to the server
    /// # Errors
    /// `Err<JsonDbError::StringErr>` with the server's reason if the value was not set
    pub fn set(self, key: KeyPath, value: Value) -> Result<()> {
        expect_ok(self.send(&Request::Set { key, value })?)
    }

    /// removes a key and its value from the document
    /// # Errors
    /// `Err<JsonDbError::StringErr>` with the server's reason if the key could not be removed
    pub fn delete(self, key: KeyPath) -> Result<()> {
        expect_ok(self.send(&Request::Delete { key })?)
    }

    /// asks the server to stop accepting connections
    pub fn exit(self) -> Result<()> {
        expect_ok(self.send(&Request::Exit)?)
    }
}

fn expect_ok(resp: Response) -> Result<()> {
    if resp.is_ok() {
        Ok(())
    } else {
        Err(remote(resp.reason))
    }
}

fn remote(reason: Option<String>) -> JsonDbError {
    JsonDbError::StringErr(reason.unwrap_or_else(|| "request rejected by server".to_string()))
}
