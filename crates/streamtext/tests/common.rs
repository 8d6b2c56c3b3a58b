#![allow(missing_docs)]

use std::{
    io::{BufRead, BufReader, Write},
    net::{SocketAddr, TcpListener, TcpStream},
    sync::mpsc::{self, Receiver},
    thread,
};

pub const TEST_JSON: &str = r#"{ "response" : "It worked!" }"#;

pub const UNICODE_TEXT: &str = "Grüße aus Köln\r\n日本語のテキスト\r\n👍 €42\r\n";

/// A blocking HTTP/1.0 server on a loopback port.
///
/// Every accepted connection gets its request head read, one response
/// written in `write_size` byte pieces, and is then closed. Request lines are
/// reported through [`MockServer::requests`].
pub struct MockServer {
    addr: SocketAddr,
    requests: Receiver<String>,
}

impl MockServer {
    pub fn start(write_size: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let (tx, requests) = mpsc::channel();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let tx = tx.clone();
                thread::spawn(move || serve(stream, write_size, &tx));
            }
        });

        Self { addr, requests }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Request line of the next connection served.
    pub fn next_request(&self) -> String {
        self.requests.recv().expect("server thread alive")
    }
}

fn serve(stream: TcpStream, write_size: usize, tx: &mpsc::Sender<String>) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    // Skip the rest of the head.
    let mut header = String::new();
    while reader.read_line(&mut header).is_ok_and(|n| n > 0) && !header.trim_end().is_empty() {
        header.clear();
    }

    let path = request_line.split(' ').nth(1).unwrap_or_default();
    let response = match path {
        "/test.json" => response("200 OK", "application/json", TEST_JSON),
        "/unicode.txt" => response("200 OK", "text/plain; charset=utf-8", UNICODE_TEXT),
        _ => response("404 Not Found", "text/plain", "not found\n"),
    };
    let _ = tx.send(request_line.clone());

    let mut stream = reader.into_inner();
    for piece in response.as_bytes().chunks(write_size.max(1)) {
        if stream.write_all(piece).and_then(|()| stream.flush()).is_err() {
            return;
        }
    }
}

fn response(status: &str, content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.0 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
}

/// Splits a raw response at the blank line ending its head.
pub fn split_head(response: &str) -> (&str, &str) {
    response
        .split_once("\r\n\r\n")
        .expect("response has a header block")
}
