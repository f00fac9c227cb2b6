use crate::dispatcher::{Dispatched, Dispatcher};
use crate::frame::{read_frame, write_frame};
use crate::thread_pool::ThreadPool;
use crate::{JsonDbEngine, JsonDbError, Response, Result};
use crossbeam::channel::{self, Receiver, Sender};
use std::io::{BufReader, BufWriter};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, warn};

/// A TCP socket server implementation over a JSON document storage engine.
/// It listens for incoming connections on a [`SocketAddr`](https://doc.rust-lang.org/std/net/enum.SocketAddr.html)
/// and serves each one as a job on its [`ThreadPool`].
///
/// Every connection carries exactly one request frame and one response frame. Each job
/// receives a handle to the [`JsonDbEngine`] through a [`Dispatcher`].
///
/// An `exit` request stops the server: no connection is accepted after the exit response has
/// been sent, and `run`/`serve` return once every connection accepted before it has been
/// answered.
///
/// # Example
/// Create and run a new server listening on "127.0.0.1:20123", with 4 threads running on a
/// shared queue thread pool, storing its document in `./data/db.json`
/// ```rust
/// use std::path::Path;
/// use jsondb::{JsonStore, JsonDbServer};
/// use jsondb::thread_pool::{SharedQueueThreadPool, ThreadPool};
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let pool = SharedQueueThreadPool::new(4)?;
/// let engine = JsonStore::open(Path::new("./data/db.json"))?;
/// let server = JsonDbServer::new(engine, pool);
/// // blocks until a client sends {"type":"exit"}
/// //server.run("127.0.0.1:20123")?;
/// # Ok(())
/// # }
/// ```
pub struct JsonDbServer<E: JsonDbEngine, P: ThreadPool> {
    /// handles the requests, holds the engine
    dispatcher: Dispatcher<E>,
    /// a pool of threads that will serve connections using a handle to the engine
    pool: P,
}

impl<E: JsonDbEngine, P: ThreadPool> JsonDbServer<E, P> {
    /// Create a new `JsonDbServer` using the given [`JsonDbEngine`] and [`ThreadPool`].
    pub fn new(engine: E, pool: P) -> Self {
        JsonDbServer {
            dispatcher: Dispatcher::new(engine),
            pool,
        }
    }

    /// binds to the given address and serves connections until an exit request arrives.
    ///
    /// # Errors
    /// returns [`JsonDbError::Io`] if the address could not be bound
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve(listener)
    }

    /// serves connections from an already bound `listener` until an exit request arrives,
    /// then waits for the connections still in progress.
    pub fn serve(self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let (shutdown, stopped) = ShutdownHandle::new(local_addr);
        info!("Listening on {}", local_addr);

        for stream in listener.incoming() {
            if stopped.try_recv().is_ok() {
                break;
            }
            match stream {
                Ok(stream) => {
                    let dispatcher = self.dispatcher.clone();
                    let shutdown = shutdown.clone();
                    self.pool.spawn(move || {
                        if let Err(e) = serve(&dispatcher, &shutdown, stream) {
                            error!("Error on serving client: {}", e);
                        }
                    });
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }
        info!("Stopped accepting connections on {}", local_addr);

        // connections accepted before the exit still get their answer
        drop(listener);
        self.pool.join();
        info!("All connections served");
        Ok(())
    }
}

/// Tells the accept loop of a running server to stop.
///
/// A blocked `accept` cannot observe a channel, so triggering also opens a throwaway
/// connection to the listener. The loop wakes up, sees the signal and returns without
/// serving that connection.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Sender<()>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    fn new(listening_on: SocketAddr) -> (ShutdownHandle, Receiver<()>) {
        let (tx, rx) = channel::unbounded();
        let mut addr = listening_on;
        if addr.ip().is_unspecified() {
            match addr {
                SocketAddr::V4(_) => addr.set_ip(Ipv4Addr::LOCALHOST.into()),
                SocketAddr::V6(_) => addr.set_ip(Ipv6Addr::LOCALHOST.into()),
            }
        }
        (ShutdownHandle { tx, addr }, rx)
    }

    /// signals the accept loop and wakes it up
    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            // the loop has already returned
            return;
        }
        if let Err(e) = TcpStream::connect(self.addr) {
            warn!("could not wake up the listener on {}: {}", self.addr, e);
        }
    }
}

/// Serves a single connection: reads one request frame from `tcp`, dispatches it, and writes
/// one response frame back. Triggers `shutdown` after responding to an exit request.
fn serve<E: JsonDbEngine>(
    dispatcher: &Dispatcher<E>,
    shutdown: &ShutdownHandle,
    tcp: TcpStream,
) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    let mut reader = BufReader::new(&tcp);
    let mut writer = BufWriter::new(&tcp);

    let request = read_frame(&mut reader)?;
    debug!("Received request from {}: {}", peer_addr, request);

    let Dispatched { response, stop } = dispatcher.dispatch(&request);
    let sent = send_response(&mut writer, &response);
    if sent.is_ok() {
        debug!("Response sent to {}: {:?}", peer_addr, response);
    }

    if stop {
        info!("Exit requested by {}", peer_addr);
        shutdown.trigger();
    }
    sent
}

fn send_response(writer: &mut BufWriter<&TcpStream>, response: &Response) -> Result<()> {
    match write_frame(writer, &response.to_json()?) {
        // a value too large for one frame is reported instead of silently dropping the reply
        Err(JsonDbError::Frame(reason)) => {
            warn!("{}", reason);
            write_frame(writer, &Response::error_with(reason).to_json()?)
        }
        other => other,
    }
}
