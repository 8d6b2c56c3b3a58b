//! The read / decode / compact loop.
//!
//! A pass of the loop looks like this:
//!
//! 1. read from the transport into the spare tail of the [`ByteChunk`]
//!    (skipped once the peer has closed, or while the chunk is full);
//! 2. [`decode_step`]: decode the unread bytes into the scratch buffer and
//!    append the scratch to the text accumulator;
//! 3. compact the chunk so undecoded bytes move to the front.
//!
//! The loop stops once the stream has ended and the chunk is empty, or when a
//! read yields nothing while neither the chunk nor the carry-over holds
//! bytes. The decoder is only told that
//! input is final on passes made after end of stream. A carry-over still held
//! at that point is flushed once, after the last pass.

use alloc::string::String;

use tracing::{debug, trace};

use crate::{
    byte_chunk::ByteChunk,
    char_buffer::CharBuffer,
    decoder::{DecodeOutcome, Utf8Decoder},
    error::Error,
    options::ReadOptions,
};

/// Decodes the unread region of `chunk` into `accumulator`.
///
/// Complete characters are decoded into `scratch` until the unread bytes run
/// out or the scratch is full; the scratch is then appended to `accumulator`
/// and cleared. A trailing incomplete sequence is moved into `state`'s
/// carry-over, so afterwards the unread region is empty unless the scratch
/// filled up first. `is_final` tells the decoder that no more bytes will
/// follow.
pub fn decode_step(
    chunk: &mut ByteChunk,
    scratch: &mut CharBuffer,
    state: &mut Utf8Decoder,
    is_final: bool,
    accumulator: &mut String,
) -> DecodeOutcome {
    let outcome = state.decode(chunk.unread(), scratch, is_final);
    chunk.consume(outcome.read);
    scratch.drain_into(accumulator);

    trace!(
        read = outcome.read,
        written = outcome.written,
        left = chunk.len(),
        carry = state.pending().len(),
        is_final,
        "decode step"
    );
    if outcome.malformed > 0 {
        debug!(
            malformed = outcome.malformed,
            policy = ?state.policy(),
            "malformed utf-8 in stream"
        );
    }
    outcome
}

/// Working state of one decoded stream: byte chunk, scratch, decoder and the
/// text decoded so far.
#[derive(Debug)]
pub struct StreamDecoder {
    chunk: ByteChunk,
    scratch: CharBuffer,
    decoder: Utf8Decoder,
    text: String,
    ended: bool,
}

impl StreamDecoder {
    /// Allocates buffers sized by `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ZeroCapacity`] if the chunk or scratch capacity is 0.
    pub fn new(options: &ReadOptions) -> Result<Self, Error> {
        options.validate()?;
        Ok(Self {
            chunk: ByteChunk::with_capacity(options.chunk_capacity),
            scratch: CharBuffer::with_capacity(options.scratch_capacity()),
            decoder: Utf8Decoder::new(options.malformed),
            text: String::new(),
            ended: false,
        })
    }

    /// Text decoded so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Takes the text decoded so far, leaving the accumulator empty. Bytes
    /// held in the chunk or in carry-over are kept for later passes.
    pub fn take_text(&mut self) -> String {
        core::mem::take(&mut self.text)
    }

    /// Returns `true` once the transport has reported end of stream.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Pushes `bytes` through the chunk and decodes them.
    ///
    /// Bytes are copied in at most one chunk at a time, so a small chunk
    /// capacity means more decode passes, just as with transport reads.
    pub fn feed(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() || !self.chunk.is_empty() {
            let n = self.chunk.extend_from_slice(bytes);
            bytes = &bytes[n..];
            self.pass();
        }
    }

    /// Ends the stream and returns all decoded text.
    ///
    /// Bytes still in the chunk are decoded as final input and any carry-over
    /// is flushed as a malformed unit.
    #[must_use]
    pub fn finish(mut self) -> String {
        self.ended = true;
        while !self.chunk.is_empty() {
            self.pass();
        }
        if self.decoder.flush(&mut self.text) {
            debug!("truncated utf-8 sequence at end of stream");
        }
        debug!(chars = self.text.chars().count(), "stream finished");
        self.text
    }

    fn pass(&mut self) {
        decode_step(
            &mut self.chunk,
            &mut self.scratch,
            &mut self.decoder,
            self.ended,
            &mut self.text,
        );
        self.chunk.compact();
    }
}

#[cfg(feature = "std")]
mod reading {
    use alloc::string::String;

    use tracing::{instrument, trace};

    use super::StreamDecoder;
    use crate::{
        error::Error,
        options::ReadOptions,
        transport::{Connection, ReadOutcome, Transport},
    };

    impl StreamDecoder {
        /// Runs the read / decode / compact loop over `transport`.
        ///
        /// Returns when the stream has ended and every buffered byte has been
        /// decoded, or when a read returns no bytes while neither the chunk nor
        /// the decoder's carry-over holds anything. A carry-over keeps the loop
        /// reading until the character completes or the stream ends; call
        /// [`finish`] to flush what is left after end of stream.
        ///
        /// # Errors
        ///
        /// A failed read aborts the loop with [`Error::Io`]; bytes decoded
        /// before the failure stay in the accumulator.
        ///
        /// [`finish`]: StreamDecoder::finish
        pub fn read_from<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), Error> {
            loop {
                if !self.ended && !self.chunk.is_full() {
                    match transport.recv(self.chunk.spare_mut())? {
                        ReadOutcome::EndOfStream => {
                            trace!(pending = self.chunk.len(), "end of stream");
                            self.ended = true;
                        }
                        ReadOutcome::Data(n) => {
                            self.chunk.commit(n);
                            trace!(n, pending = self.chunk.len(), "read");
                        }
                    }
                }
                if self.chunk.is_empty() {
                    if self.ended || !self.decoder.has_pending() {
                        return Ok(());
                    }
                    // A split character still waits for its remaining bytes.
                    continue;
                }
                self.pass();
            }
        }
    }

    /// Reads `transport` to the end with a working chunk of `chunk_capacity`
    /// bytes and returns the decoded text.
    ///
    /// The transport is closed before returning, on success and on error.
    ///
    /// # Errors
    ///
    /// See [`read_loop_with`].
    pub fn read_loop<T: Transport>(transport: T, chunk_capacity: usize) -> Result<String, Error> {
        read_loop_with(
            transport,
            &ReadOptions {
                chunk_capacity,
                ..ReadOptions::default()
            },
        )
    }

    /// Reads `transport` to the end using `options` and returns the decoded
    /// text.
    ///
    /// The transport is closed exactly once before returning, whether the
    /// loop finished or failed.
    ///
    /// # Errors
    ///
    /// - [`Error::ZeroCapacity`] for a zero chunk or scratch capacity; the
    ///   transport is closed without being read.
    /// - [`Error::Io`] if a read or the final close fails.
    #[instrument(level = "debug", skip_all, fields(chunk_capacity = options.chunk_capacity))]
    pub fn read_loop_with<T: Transport>(transport: T, options: &ReadOptions) -> Result<String, Error> {
        let mut conn = Connection::new(transport);
        let mut decoder = StreamDecoder::new(options)?;
        decoder.read_from(conn.get_mut())?;
        conn.close()?;
        Ok(decoder.finish())
    }
}

#[cfg(feature = "std")]
pub use reading::{read_loop, read_loop_with};
