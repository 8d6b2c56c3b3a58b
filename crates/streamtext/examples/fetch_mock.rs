//! Fetches `/test.json` from a throwaway local server with a tiny chunk
//! capacity and prints what came back.
//!
//! The server writes its response a few bytes at a time, so multi-byte
//! characters regularly straddle both socket reads and decode passes. Run
//! with `RUST_LOG=streamtext=trace` to watch every decode step:
//!
//! ```text
//! RUST_LOG=streamtext=trace cargo run -p streamtext --example fetch_mock
//! ```

use std::{
    io::{BufRead, BufReader, Write},
    net::TcpListener,
    thread,
};

use streamtext::{Error, FetchOptions, ReadMode, ReadOptions, fetch};
use tracing::info;
use tracing_subscriber::EnvFilter;

const BODY: &str = r#"{ "response" : "It worked!", "note" : "Grüße 👍" }"#;

fn spawn_server() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?.to_string();

    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            while reader.read_line(&mut line).is_ok_and(|n| n > 0) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let response = format!(
                "HTTP/1.0 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{BODY}",
                BODY.len()
            );
            let mut stream = reader.into_inner();
            for piece in response.as_bytes().chunks(5) {
                if stream.write_all(piece).is_err() {
                    break;
                }
            }
        }
    });
    Ok(addr)
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("streamtext=debug")),
        )
        .init();

    let addr = spawn_server()?;
    info!(%addr, "mock server listening");

    for mode in [ReadMode::Buffers, ReadMode::Lines] {
        let options = FetchOptions {
            read: ReadOptions {
                chunk_capacity: 8,
                ..Default::default()
            },
            mode,
        };
        let text = fetch(&addr, "/test.json", &options)?;
        info!(?mode, worked = text.contains("It worked!"), "fetched");
        println!("--- {mode:?} ---\n{text}");
    }
    Ok(())
}
