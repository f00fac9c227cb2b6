use crossbeam_utils::sync::WaitGroup;
use jsondb::frame::{encode, read_frame};
use jsondb::{
    JsonDbClient, JsonDbEngine, JsonDbServer, JsonStore, KeyPath, RayonThreadPool, Request,
    Result, SharedQueueThreadPool, ThreadPool,
};
use serde_json::json;
use std::io::Write;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

// starts a server on an ephemeral port, returns its address and the thread running it
fn start<P: ThreadPool + Send + 'static>(
    temp_dir: &TempDir,
    pool: P,
) -> Result<(SocketAddr, JoinHandle<Result<()>>)> {
    let engine = JsonStore::open(&temp_dir.path().join("db.json"))?;
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let handle = thread::spawn(move || JsonDbServer::new(engine, pool).serve(listener));
    Ok((addr, handle))
}

#[test]
fn client_server_round_trip() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let (addr, server) = start(&temp_dir, SharedQueueThreadPool::new(4)?)?;

    JsonDbClient::connect(addr)?.set(KeyPath::single("person"), json!({}))?;
    JsonDbClient::connect(addr)?.set(
        KeyPath::new(vec!["person", "name"]).expect("non-empty key"),
        json!("Ada"),
    )?;
    assert_eq!(
        JsonDbClient::connect(addr)?.get(KeyPath::single("person"))?,
        Some(json!({"name": "Ada"}))
    );
    JsonDbClient::connect(addr)?.delete(KeyPath::single("person"))?;
    assert_eq!(JsonDbClient::connect(addr)?.get(KeyPath::single("person"))?, None);

    let err = JsonDbClient::connect(addr)?
        .delete(KeyPath::single("person"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Key not found.");

    assert_eq!(
        JsonDbClient::connect(addr)?.send_raw(r#"{"type":"bogus"}"#)?,
        r#"{"response":"ERROR"}"#
    );

    assert_eq!(
        JsonDbClient::connect(addr)?.send_raw(r#"{"type":"exit"}"#)?,
        r#"{"response":"OK"}"#
    );
    server.join().expect("server thread panicked")?;
    Ok(())
}

#[test]
fn exit_stops_accepting_connections() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let (addr, server) = start(&temp_dir, RayonThreadPool::new(2)?)?;

    JsonDbClient::connect(addr)?.exit()?;
    server.join().expect("server thread panicked")?;

    // the listener is gone once `serve` has returned
    assert!(TcpStream::connect(addr).is_err());
    Ok(())
}

#[test]
fn concurrent_clients() -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let (addr, server) = start(&temp_dir, SharedQueueThreadPool::new(4)?)?;

    let wg = WaitGroup::new();
    for i in 0..16 {
        let wg = wg.clone();
        thread::spawn(move || {
            let key = KeyPath::single(format!("key{}", i));
            let stored = JsonDbClient::connect(addr)
                .and_then(|client| client.set(key.clone(), json!(i)))
                .and_then(|_| JsonDbClient::connect(addr))
                .and_then(|client| client.get(key));
            assert_eq!(stored.ok().flatten(), Some(json!(i)));
            drop(wg);
        });
    }
    wg.wait();

    for i in 0..16 {
        let key = KeyPath::single(format!("key{}", i));
        assert_eq!(JsonDbClient::connect(addr)?.get(key)?, Some(json!(i)));
    }

    JsonDbClient::connect(addr)?.exit()?;
    server.join().expect("server thread panicked")?;
    Ok(())
}

// A connection accepted before the exit request is still answered, and its set is on disk
// once `serve` returns
fn exit_waits_for_accepted_connections<P: ThreadPool + Send + 'static>(pool: P) -> Result<()> {
    let temp_dir = TempDir::new().expect("unable to create temporary working directory");
    let (addr, server) = start(&temp_dir, pool)?;

    let set = Request::Set {
        key: KeyPath::single("late"),
        value: json!({"n": 1}),
    };
    let payload = encode(&set.to_json()?);
    let len = u16::try_from(payload.len()).expect("small request");

    // the server accepts this connection, then blocks reading the rest of the frame
    let mut slow = TcpStream::connect(addr)?;
    slow.write_all(&len.to_be_bytes())?;
    slow.flush()?;
    thread::sleep(Duration::from_millis(100));

    JsonDbClient::connect(addr)?.exit()?;
    thread::sleep(Duration::from_millis(100));
    assert!(!server.is_finished(), "server returned with a connection in progress");

    slow.write_all(&payload)?;
    slow.flush()?;
    assert_eq!(read_frame(&mut slow)?, r#"{"response":"OK"}"#);

    server.join().expect("server thread panicked")?;
    assert!(TcpStream::connect(addr).is_err());

    let store = JsonStore::open(&temp_dir.path().join("db.json"))?;
    assert_eq!(store.get(&KeyPath::single("late"))?, Some(json!({"n": 1})));
    Ok(())
}

#[test]
fn exit_waits_for_accepted_connections_shared_queue() -> Result<()> {
    exit_waits_for_accepted_connections(SharedQueueThreadPool::new(2)?)
}

#[test]
fn exit_waits_for_accepted_connections_rayon() -> Result<()> {
    exit_waits_for_accepted_connections(RayonThreadPool::new(2)?)
}
