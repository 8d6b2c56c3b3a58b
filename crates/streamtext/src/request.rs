//! One-shot HTTP/1.0 `GET` over a transport.
//!
//! No response parsing happens here: the status line, headers and body are
//! returned as one decoded string.

use alloc::{format, string::String, vec::Vec};
use std::{
    io::{BufRead, BufReader},
    net::TcpStream,
};

use tracing::{debug, instrument};

use crate::{
    error::Error,
    options::{FetchOptions, ReadMode},
    stream::StreamDecoder,
    transport::{Connection, Transport},
};

/// Builds the request sent for `path`: `GET <path> HTTP/1.0` followed by an
/// empty header block.
///
/// ```rust
/// assert_eq!(
///     streamtext::request_line("/test.json").unwrap(),
///     "GET /test.json HTTP/1.0\r\n\r\n"
/// );
/// ```
///
/// # Errors
///
/// [`Error::EmptyPath`] for an empty path and [`Error::InvalidPath`] for a
/// path containing whitespace or control characters.
pub fn request_line(path: &str) -> Result<String, Error> {
    if path.is_empty() {
        return Err(Error::EmptyPath);
    }
    if let Some(c) = path.chars().find(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::InvalidPath(c));
    }
    Ok(format!("GET {path} HTTP/1.0\r\n\r\n"))
}

/// Connects to `addr`, requests `path` and returns the whole decoded
/// response.
///
/// # Errors
///
/// - [`Error::EmptyPath`], [`Error::InvalidPath`] or
///   [`Error::ZeroCapacity`] before any connection is made;
/// - [`Error::Connect`] if the connection can't be opened;
/// - [`Error::Io`] if sending, reading or closing fails.
#[instrument(level = "debug", skip(options))]
pub fn fetch(addr: &str, path: &str, options: &FetchOptions) -> Result<String, Error> {
    // Validate before touching the network.
    request_line(path)?;
    options.read.validate()?;

    let stream = TcpStream::connect(addr).map_err(|source| Error::Connect {
        addr: addr.into(),
        source,
    })?;
    debug!(peer = ?stream.peer_addr().ok(), "connected");
    fetch_over(stream, path, options)
}

/// Sends the request for `path` over an already open `transport` and reads
/// the response in the configured [`ReadMode`].
///
/// The transport is closed exactly once before returning.
///
/// # Errors
///
/// As for [`fetch`], minus connection errors.
pub fn fetch_over<T: Transport>(
    transport: T,
    path: &str,
    options: &FetchOptions,
) -> Result<String, Error> {
    let mut conn = Connection::new(transport);
    let request = request_line(path)?;
    conn.get_mut().send(request.as_bytes())?;

    let text = match options.mode {
        ReadMode::Buffers => {
            let mut decoder = StreamDecoder::new(&options.read)?;
            decoder.read_from(conn.get_mut())?;
            decoder.finish()
        }
        ReadMode::Lines => read_lines(&mut conn, options)?,
    };
    conn.close()?;
    debug!(len = text.len(), mode = ?options.mode, "response read");
    Ok(text)
}

/// Reads `conn` line by line. A line ends at `\n`, `\r\n` or a lone `\r`;
/// each is appended followed by a single `\n`, including an unterminated last
/// line.
fn read_lines<T: Transport>(
    conn: &mut Connection<T>,
    options: &FetchOptions,
) -> Result<String, Error> {
    let mut decoder = StreamDecoder::new(&options.read)?;
    let mut reader = BufReader::with_capacity(options.read.chunk_capacity, conn);
    let mut line = Vec::new();
    let mut out = String::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        decoder.feed(&line);
        if line.last() != Some(&b'\n') {
            // Only the last line can lack a terminator.
            break;
        }
        push_lines(&mut out, &decoder.take_text());
    }

    let rest = decoder.finish();
    if !rest.is_empty() {
        push_lines(&mut out, &rest);
    }
    Ok(out)
}

/// Appends the lines of `text`, which holds at most one `\n`, at its end.
/// `\r\n` counts as a single terminator; any other `\r` ends a line.
fn push_lines(out: &mut String, text: &str) {
    let body = match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text.strip_suffix('\r').unwrap_or(text),
    };
    for line in body.split('\r') {
        out.push_str(line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use std::io;

    use super::{fetch_over, push_lines, request_line};
    use crate::{Error, FetchOptions, ReadMode, ReadOptions, chunk_utils::ScriptedTransport};

    #[test]
    fn request_line_rejects_bad_paths() {
        assert!(matches!(request_line(""), Err(Error::EmptyPath)));
        assert!(matches!(request_line("/a b"), Err(Error::InvalidPath(' '))));
        assert!(matches!(
            request_line("/a\r\nHost: x"),
            Err(Error::InvalidPath('\r'))
        ));
    }

    #[test]
    fn sends_request_and_decodes_buffers() {
        let mut transport = ScriptedTransport::new(["HTTP/1.0 200 OK\r\n\r\nh", "\u{e9}llo"]);
        let closes = transport.close_counter();
        let text = fetch_over(&mut transport, "/test.json", &FetchOptions::default()).unwrap();
        assert_eq!(text, "HTTP/1.0 200 OK\r\n\r\nhéllo");
        assert_eq!(transport.sent(), b"GET /test.json HTTP/1.0\r\n\r\n");
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn lines_mode_normalizes_terminators() {
        let transport = ScriptedTransport::new([
            &b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\n"[..],
            &b"caf\xC3"[..],
            &b"\xA9\nlast \xE2\x82"[..],
        ]);
        let options = FetchOptions {
            mode: ReadMode::Lines,
            read: ReadOptions {
                chunk_capacity: 4,
                ..Default::default()
            },
        };
        let text = fetch_over(transport, "/", &options).unwrap();
        assert_eq!(
            text,
            "HTTP/1.0 200 OK\nContent-Type: text/plain\n\ncafé\nlast \u{FFFD}\n"
        );
    }

    #[test]
    fn lone_carriage_return_ends_a_line() {
        let transport = ScriptedTransport::new([
            &b"HTTP/1.0 200 OK\r\n\r\none\rtwo\r"[..],
            &b"\nthree\r\r\nfour\r"[..],
        ]);
        let options = FetchOptions {
            mode: ReadMode::Lines,
            ..Default::default()
        };
        let text = fetch_over(transport, "/", &options).unwrap();
        assert_eq!(text, "HTTP/1.0 200 OK\n\none\ntwo\nthree\n\nfour\n");
    }

    #[test]
    fn push_lines_terminators() {
        let mut out = String::new();
        for text in ["a\n", "b\r\n", "c\rd\n", "\n", "e\r", "f"] {
            push_lines(&mut out, text);
        }
        assert_eq!(out, "a\nb\nc\nd\n\ne\nf\n");
    }

    #[test]
    fn read_error_propagates_and_closes() {
        let transport =
            ScriptedTransport::new(["HTTP/1.0 200"]).then_fail(io::ErrorKind::ConnectionReset);
        let closes = transport.close_counter();
        let err = fetch_over(transport, "/", &FetchOptions::default()).unwrap_err();
        assert!(
            matches!(&err, Error::Io(e) if e.kind() == io::ErrorKind::ConnectionReset),
            "{err}"
        );
        assert_eq!(closes.get(), 1);
    }
}
