//! Stateful UTF-8 decoder with explicit carry-over.
//!
//! [`Utf8Decoder`] turns byte slices into characters one slice at a time. A
//! multi-byte sequence cut off by the end of a slice is copied into the
//! decoder's carry-over (at most three bytes) and completed from the front of
//! the next slice, so callers never have to hold those bytes back themselves.
//!
//! Malformed input is handled with the same "maximal subpart" rule as
//! [`String::from_utf8_lossy`]: every maximal prefix of a sequence that cannot
//! become valid is one malformed unit. A sequence that is merely incomplete is
//! only malformed when the caller says no more input will arrive.

use alloc::string::String;

use crate::{char_buffer::CharBuffer, options::MalformedPolicy};

/// Longest UTF-8 prefix that can still be incomplete.
const MAX_PENDING: usize = 3;

/// Why a [`Utf8Decoder::decode`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every input byte was decoded or taken into carry-over.
    InputEmpty,
    /// The scratch buffer filled up; `read` stops before the first byte that
    /// was not decoded.
    OutputFull,
}

/// Result of a single decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Input bytes consumed, including bytes moved into carry-over.
    pub read: usize,
    /// Characters pushed into the scratch buffer.
    pub written: usize,
    /// Malformed units encountered (replaced or dropped per policy).
    pub malformed: usize,
    /// Whether the call ran out of input or out of scratch space.
    pub status: DecodeStatus,
}

impl DecodeOutcome {
    fn new() -> Self {
        Self {
            read: 0,
            written: 0,
            malformed: 0,
            status: DecodeStatus::InputEmpty,
        }
    }

    fn full(mut self) -> Self {
        self.status = DecodeStatus::OutputFull;
        self
    }
}

/// Incremental UTF-8 decoder for one logical byte stream.
#[derive(Debug, Clone)]
pub struct Utf8Decoder {
    policy: MalformedPolicy,
    pending: [u8; MAX_PENDING],
    pending_len: usize,
}

impl Default for Utf8Decoder {
    fn default() -> Self {
        Self::new(MalformedPolicy::default())
    }
}

impl Utf8Decoder {
    /// Creates a decoder with no carry-over.
    #[must_use]
    pub fn new(policy: MalformedPolicy) -> Self {
        Self {
            policy,
            pending: [0; MAX_PENDING],
            pending_len: 0,
        }
    }

    /// Handling applied to malformed input.
    #[must_use]
    pub fn policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Returns `true` if a partial sequence is waiting for more bytes.
    #[must_use]
    #[inline]
    pub fn has_pending(&self) -> bool {
        self.pending_len > 0
    }

    /// The partial sequence carried over from earlier input.
    #[must_use]
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.pending[..self.pending_len]
    }

    /// Forgets any carry-over so the decoder can start a new stream.
    pub fn reset(&mut self) {
        self.pending_len = 0;
    }

    /// Decodes `input` into `out`.
    ///
    /// Decoding stops early only when `out` is full. Otherwise every byte is
    /// consumed: complete characters go to `out`, malformed units are handled
    /// per policy and a trailing incomplete sequence moves into carry-over.
    /// When `last` is set, an incomplete sequence at the end of `input` (or a
    /// carry-over that `input` does not complete) is treated as malformed
    /// instead.
    pub fn decode(&mut self, input: &[u8], out: &mut CharBuffer, last: bool) -> DecodeOutcome {
        let mut outcome = DecodeOutcome::new();

        if self.has_pending() && !input.is_empty() {
            if out.remaining() == 0 {
                return outcome.full();
            }
            self.resume(input, out, &mut outcome);
        }

        let mut pos = outcome.read;
        for chunk in input[pos..].utf8_chunks() {
            for c in chunk.valid().chars() {
                if !out.push(c) {
                    outcome.read = pos;
                    return outcome.full();
                }
                outcome.written += 1;
                pos += c.len_utf8();
            }

            let invalid = chunk.invalid();
            if invalid.is_empty() {
                continue;
            }
            let at_end = pos + invalid.len() == input.len();
            if at_end && !last && is_incomplete(invalid) {
                self.stash(invalid);
            } else if !self.malformed(out, &mut outcome) {
                outcome.read = pos;
                return outcome.full();
            }
            pos += invalid.len();
        }
        outcome.read = pos;

        if last && self.has_pending() {
            if !self.malformed(out, &mut outcome) {
                return outcome.full();
            }
            self.reset();
        }
        outcome
    }

    /// Ends the stream: a carry-over left behind is treated as one malformed
    /// unit and written straight to `dst`.
    ///
    /// Returns `true` if there was carry-over to flush.
    pub fn flush(&mut self, dst: &mut String) -> bool {
        if !self.has_pending() {
            return false;
        }
        self.reset();
        if self.policy == MalformedPolicy::Replace {
            dst.push(char::REPLACEMENT_CHARACTER);
        }
        true
    }

    /// Completes (or rejects) the carry-over using the front of `input`.
    fn resume(&mut self, input: &[u8], out: &mut CharBuffer, outcome: &mut DecodeOutcome) {
        let held = self.pending_len;
        let take = (MAX_PENDING + 1 - held).min(input.len());
        let mut window = [0u8; MAX_PENDING + 1];
        window[..held].copy_from_slice(self.pending());
        window[held..held + take].copy_from_slice(&input[..take]);
        let window = &window[..held + take];

        match bstr::decode_utf8(window) {
            (Some(c), size) => {
                // The carry-over is a valid prefix, so the character starts at
                // offset 0 and is longer than what was held.
                out.push(c);
                outcome.written += 1;
                outcome.read = size - held;
                self.reset();
            }
            (None, size) if size == window.len() && is_incomplete(window) => {
                // Still incomplete; a four-byte window is never a bare prefix,
                // so all of `input` fit into it.
                self.stash(window);
                outcome.read = take;
            }
            (None, size) => {
                // Room was checked by the caller.
                self.malformed(out, outcome);
                outcome.read = size.saturating_sub(held);
                self.reset();
            }
        }
    }

    fn stash(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= MAX_PENDING, "carry-over overflow");
        self.pending[..bytes.len()].copy_from_slice(bytes);
        self.pending_len = bytes.len();
    }

    /// Records one malformed unit. Returns `false` if a replacement character
    /// was due but `out` had no room.
    fn malformed(&self, out: &mut CharBuffer, outcome: &mut DecodeOutcome) -> bool {
        match self.policy {
            MalformedPolicy::Replace => {
                if !out.push(char::REPLACEMENT_CHARACTER) {
                    return false;
                }
                outcome.written += 1;
            }
            MalformedPolicy::Ignore => {}
        }
        outcome.malformed += 1;
        true
    }
}

/// A byte run is incomplete (rather than invalid) if it is a valid UTF-8
/// prefix that merely ran out of bytes.
fn is_incomplete(bytes: &[u8]) -> bool {
    matches!(core::str::from_utf8(bytes), Err(e) if e.error_len().is_none())
}
