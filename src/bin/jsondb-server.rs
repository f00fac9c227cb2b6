//! this binary starts the jsondb server
//! to see the list of options, type: `jsondb-server --help`
//!
//! The server keeps its document in the file given by `--db` (default `./data/db.json`),
//! creating it as `{}` if it does not exist, and runs until a client sends an `exit` request.

use clap::{arg_enum, crate_version, value_t, App, Arg};
use jsondb::{
    JsonDbEngine, JsonDbError, JsonDbServer, JsonStore, RayonThreadPool, Result,
    SharedQueueThreadPool, ThreadPool,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::exit;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Pool {
        shared,
        rayon
    }
}

const DEFAULT_ADDRESS: &str = "127.0.0.1:20123";
const DEFAULT_DB_FILE: &str = "./data/db.json";
const DEFAULT_THREADS: &str = "4";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    db: PathBuf,
    threads: u32,
    pool: Pool,
}

impl Opt {
    /// validates the raw command line values
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`JsonDbError::Parsing`] if one of the parameters is invalid
    ///
    fn build(addr: &str, db: &str, threads: &str, pool: Pool) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            JsonDbError::Parsing(format!("could not parse {} into an IP address and port", &addr))
        })?;
        let threads: u32 = threads
            .parse()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| JsonDbError::Parsing(format!("invalid thread count: {}", threads)))?;

        Ok(Opt {
            addr,
            db: PathBuf::from(db),
            threads,
            pool,
        })
    }
}

fn main() {
    // set up a tracing subscriber to log to STDERR
    subscriber_config();

    // parse command line args
    let matches = App::new("jsondb-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a multi-threaded JSON document store")
        .arg(
            Arg::with_name("addr")
                .long("addr")
                .value_name("IP_ADDR:PORT")
                .help("sets the IP_ADDR:PORT that the server listens on")
                .default_value(DEFAULT_ADDRESS),
        )
        .arg(
            Arg::with_name("db")
                .long("db")
                .value_name("FILE")
                .help("sets the file holding the JSON document")
                .default_value(DEFAULT_DB_FILE),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .value_name("N")
                .help("sets the number of worker threads serving connections")
                .default_value(DEFAULT_THREADS),
        )
        .arg(
            Arg::with_name("pool")
                .long("pool")
                .value_name("POOL")
                .help("sets the thread pool implementation, either 'shared' or 'rayon'")
                .possible_values(&Pool::variants())
                .case_insensitive(true)
                .default_value("shared"),
        )
        .get_matches();

    // clap fills in defaults, so these values are always present
    let addr = matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS);
    let db = matches.value_of("db").unwrap_or(DEFAULT_DB_FILE);
    let threads = matches.value_of("threads").unwrap_or(DEFAULT_THREADS);
    let pool = value_t!(matches, "pool", Pool).unwrap_or(Pool::shared);

    let opt = match Opt::build(addr, db, threads, pool) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("jsondb-server {}", env!("CARGO_PKG_VERSION"));
    info!("Document file: {}", opt.db.display());
    info!("Thread pool: {} with {} threads", opt.pool, opt.threads);

    let engine = JsonStore::open(&opt.db)?;
    println!("Server started!");
    let served = match opt.pool {
        Pool::shared => run_with(engine, SharedQueueThreadPool::new(opt.threads)?, opt.addr),
        Pool::rayon => run_with(engine, RayonThreadPool::new(opt.threads)?, opt.addr),
    };
    served?;
    info!("jsondb-server stopped");
    Ok(())
}

fn run_with<E: JsonDbEngine, P: ThreadPool>(engine: E, pool: P, addr: SocketAddr) -> Result<()> {
    let server = JsonDbServer::new(engine, pool);
    server.run(addr)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than DEBUG (e.g, info, warn, etc.)
        // will be written to stderr.
        .with_max_level(Level::DEBUG)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
