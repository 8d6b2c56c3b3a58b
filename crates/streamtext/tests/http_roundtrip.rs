#![expect(missing_docs)]

mod common;

use std::net::TcpStream;

use regex::Regex;
use rstest::rstest;
use streamtext::{Error, FetchOptions, ReadMode, ReadOptions, fetch, read_loop, request_line};

use crate::common::{MockServer, TEST_JSON, UNICODE_TEXT, split_head};

fn buffers(chunk_capacity: usize) -> FetchOptions {
    FetchOptions {
        read: ReadOptions {
            chunk_capacity,
            ..Default::default()
        },
        mode: ReadMode::Buffers,
    }
}

fn status_line() -> Regex {
    Regex::new(r"^HTTP/1\.0 (?<code>\d{3}) [A-Za-z ]+\r?\n").unwrap()
}

#[rstest]
#[case::default_capacity(8192)]
#[case::small_capacity(8)]
#[case::single_byte(1)]
fn test_json_works(#[case] chunk_capacity: usize) {
    let server = MockServer::start(5);
    let text = fetch(&server.addr(), "/test.json", &buffers(chunk_capacity)).unwrap();

    assert_eq!(server.next_request(), "GET /test.json HTTP/1.0\r\n");
    assert!(text.contains("It worked!"), "{text:?}");

    let caps = status_line().captures(&text).expect("status line");
    assert_eq!(&caps["code"], "200");

    let (_, body) = split_head(&text);
    assert_eq!(body, TEST_JSON);
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["response"], "It worked!");
}

#[test]
fn test_json_works_in_lines_mode() {
    let server = MockServer::start(3);
    let options = FetchOptions {
        mode: ReadMode::Lines,
        ..Default::default()
    };
    let text = fetch(&server.addr(), "/test.json", &options).unwrap();

    assert!(text.contains("It worked!"), "{text:?}");
    assert!(!text.contains('\r'));
    assert!(text.starts_with("HTTP/1.0 200 OK\n"));
    assert!(text.ends_with(&format!("\n\n{TEST_JSON}\n")));
}

#[rstest]
#[case(1, 1)]
#[case(2, 3)]
#[case(3, 7)]
#[case(8, 2)]
#[case(8192, 64)]
fn multibyte_body_survives_any_split(#[case] chunk_capacity: usize, #[case] write_size: usize) {
    let server = MockServer::start(write_size);
    let text = fetch(&server.addr(), "/unicode.txt", &buffers(chunk_capacity)).unwrap();
    let (head, body) = split_head(&text);
    assert!(head.contains("charset=utf-8"));
    assert_eq!(body, UNICODE_TEXT);
    assert!(!text.contains('\u{FFFD}'));
}

#[test]
fn unknown_path_reads_not_found() {
    let server = MockServer::start(16);
    let text = fetch(&server.addr(), "/missing", &FetchOptions::default()).unwrap();
    let caps = status_line().captures(&text).expect("status line");
    assert_eq!(&caps["code"], "404");
}

#[test]
fn read_loop_over_raw_stream() {
    let server = MockServer::start(4);
    let mut stream = TcpStream::connect(server.addr()).unwrap();
    streamtext::Transport::send(&mut stream, request_line("/test.json").unwrap().as_bytes())
        .unwrap();
    let text = read_loop(stream, 8).unwrap();
    assert!(text.contains("It worked!"));
}

#[test]
fn invalid_path_is_rejected_before_connecting() {
    // Nothing listens here; validation must fail first.
    let err = fetch("127.0.0.1:9", "/a b", &FetchOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidPath(' ')), "{err}");
}

#[test]
fn refused_connection_names_the_address() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let err = fetch(&addr, "/test.json", &FetchOptions::default()).unwrap_err();
    assert!(matches!(&err, Error::Connect { addr: a, .. } if *a == addr), "{err}");
    assert!(err.to_string().contains(&addr));
}
