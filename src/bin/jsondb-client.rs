//! The jsondb-client executable sends a single request to a jsondb server and prints the
//! request and the response. It supports the following command line arguments:
//!
//! `jsondb-client -t <TYPE> [-k <KEY>] [-v <VALUE>...] [--addr IP-PORT]`
//!
//!     Build a request of the given type: set, get, delete or exit.
//!     -k is required for set, get and delete, -v for set. Several -v words are joined
//!     with single spaces into one string value.
//!
//! `jsondb-client --in <FILE> [--addr IP-PORT]`
//!
//!     Send the contents of FILE as the request, unchanged. This allows compound keys and
//!     non-string values, e.g. {"type":"set","key":["person","age"],"value":42}
//!
//! If --addr is not specified then connect on 127.0.0.1:20123.
//! A non-zero exit code is returned if the request could not be built or sent. A response of
//! ERROR is printed like any other response.

use clap::{crate_version, App, Arg, ArgMatches};
use jsondb::{JsonDbClient, JsonDbError, KeyPath, Request, Result, Value};
use std::fs;
use std::net::SocketAddr;
use std::process::exit;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:20123";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's ip:port
    addr: SocketAddr,
    /// the request text to send
    request: String,
}

fn main() {
    // configure a subscriber that will log messages to STDERR
    subscriber_config();

    let matches = App::new("jsondb-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("sends a request to a jsondb server")
        .arg(
            Arg::with_name("type")
                .short("t")
                .value_name("TYPE")
                .help("the request type: set, get, delete or exit")
                .required_unless("in"),
        )
        .arg(
            Arg::with_name("key")
                .short("k")
                .value_name("KEY")
                .help("the key to set, get or delete"),
        )
        .arg(
            Arg::with_name("value")
                .short("v")
                .value_name("VALUE")
                .help("the value to set, several words are joined with spaces")
                .multiple(true),
        )
        .arg(
            Arg::with_name("in")
                .long("in")
                .value_name("FILE")
                .help("reads the request from FILE instead of building it")
                .conflicts_with_all(&["type", "key", "value"]),
        )
        .arg(
            Arg::with_name("addr")
                .long("addr")
                .value_name("IP_ADDR:PORT")
                .help("sets the IP_ADDR:PORT of the server to connect to")
                .default_value(DEFAULT_ADDRESS),
        )
        .get_matches();

    let result = parse_options(&matches).and_then(run);
    if let Err(e) = result {
        eprintln!("{}", e);
        exit(1);
    }
}

/// sends the request held by `opt` and prints the exchange
fn run(opt: Opt) -> Result<()> {
    println!("Client started!");
    let client = JsonDbClient::connect(opt.addr)?;
    println!("Sent: {}", opt.request);
    let response = client.send_raw(&opt.request)?;
    println!("Received: {}", response);
    info!("request to {} complete", opt.addr);
    Ok(())
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    let addr = matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS);
    let addr: SocketAddr = addr.parse().map_err(|_| {
        JsonDbError::Parsing(format!("could not parse {} into an IP address and port", &addr))
    })?;

    let request = match matches.value_of("in") {
        Some(file) => fs::read_to_string(file)?,
        None => build_request(matches)?.to_json()?,
    };
    Ok(Opt { addr, request })
}

/// builds a [`Request`] from the -t, -k and -v options
fn build_request(matches: &ArgMatches) -> Result<Request> {
    let kind = matches.value_of("type").unwrap_or_default().to_lowercase();
    let key = || {
        matches
            .value_of("key")
            .map(KeyPath::single)
            .ok_or_else(|| JsonDbError::Parsing(format!("a {} request needs -k <KEY>", kind)))
    };

    match kind.as_str() {
        "set" => {
            let words: Vec<&str> = matches
                .values_of("value")
                .map(|values| values.collect())
                .unwrap_or_default();
            if words.is_empty() {
                return Err(JsonDbError::Parsing("a set request needs -v <VALUE>".to_string()));
            }
            Ok(Request::Set {
                key: key()?,
                value: Value::String(words.join(" ")),
            })
        }
        "get" => Ok(Request::Get { key: key()? }),
        "delete" => Ok(Request::Delete { key: key()? }),
        "exit" => Ok(Request::Exit),
        other => Err(JsonDbError::Parsing(format!(
            "unknown request type: {}, expected set, get, delete or exit",
            other
        ))),
    }
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // only warnings and errors, stdout carries the exchange itself
        .with_max_level(Level::WARN)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
