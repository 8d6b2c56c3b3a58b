//! Incremental UTF-8 decoding of byte streams read off a socket.
//!
//! Bytes arrive in bounded chunks of any size, including chunks smaller than
//! a single encoded character. [`decode_step`] turns the unread part of a
//! [`ByteChunk`] into text through a stateful [`Utf8Decoder`] that carries a
//! split multi-byte sequence over to the next call, and [`read_loop`] drives
//! the read / decode / compact cycle over a [`Transport`] until the peer
//! closes the stream.
//!
//! ```rust
//! use streamtext::{chunk_utils::ScriptedTransport, read_loop};
//!
//! // "€" is three bytes; a one-byte chunk still decodes it.
//! let transport = ScriptedTransport::new(["ok €".as_bytes()]);
//! let text = read_loop(transport, 1).unwrap();
//! assert_eq!(text, "ok €");
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod byte_chunk;
mod char_buffer;
mod decoder;
mod error;
mod options;
mod stream;

#[cfg(feature = "std")]
mod request;
#[cfg(feature = "std")]
mod transport;

pub mod chunk_utils;


pub use byte_chunk::ByteChunk;
pub use char_buffer::CharBuffer;
pub use decoder::{DecodeOutcome, DecodeStatus, Utf8Decoder};
pub use error::Error;
pub use options::{FetchOptions, MalformedPolicy, ReadMode, ReadOptions};
#[cfg(feature = "std")]
pub use request::{fetch, fetch_over, request_line};
pub use stream::{StreamDecoder, decode_step};
#[cfg(feature = "std")]
pub use stream::{read_loop, read_loop_with};
#[cfg(feature = "std")]
pub use transport::{Connection, IoTransport, ReadOutcome, Transport};
