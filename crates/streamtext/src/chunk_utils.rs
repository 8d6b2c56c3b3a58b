//! Helpers for splitting payloads into chunks and replaying them.
//!
//! Unlike text-oriented splitters these cut at arbitrary byte offsets, so
//! multi-byte characters regularly end up spread over several chunks.

use alloc::vec::Vec;

/// Split `payload` into `parts` chunks of roughly equal size, ignoring
/// character boundaries.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// Split `payload` into chunks whose sizes are derived from `splits`.
///
/// Each entry picks the size of the next chunk (`1 + s % remaining`); the
/// rest of the payload forms the final chunk once `splits` runs out. Every
/// chunk is at least one byte.
#[must_use]
pub fn split_by<'a>(payload: &'a [u8], splits: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut rest = payload;
    for &s in splits {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + s % rest.len());
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

#[cfg(feature = "std")]
pub use scripted::ScriptedTransport;

#[cfg(feature = "std")]
mod scripted {
    use alloc::{collections::VecDeque, rc::Rc, vec::Vec};
    use core::cell::Cell;
    use std::io;

    use crate::transport::{ReadOutcome, Transport};

    enum Step {
        Bytes(Vec<u8>),
        Idle,
        Fail(io::ErrorKind),
    }

    /// In-memory [`Transport`] that replays a script of chunks.
    ///
    /// Each scripted chunk is delivered by one or more `recv` calls (a chunk
    /// larger than the caller's buffer is split, never merged with the next
    /// one). After the script runs out the transport reports end of stream.
    /// Sent bytes are recorded and closes are counted.
    pub struct ScriptedTransport {
        script: VecDeque<Step>,
        sent: Vec<u8>,
        closes: Rc<Cell<usize>>,
    }

    impl ScriptedTransport {
        /// Replays `chunks` in order.
        pub fn new<I, B>(chunks: I) -> Self
        where
            I: IntoIterator<Item = B>,
            B: AsRef<[u8]>,
        {
            Self {
                script: chunks
                    .into_iter()
                    .map(|c| Step::Bytes(c.as_ref().to_vec()))
                    .collect(),
                sent: Vec::new(),
                closes: Rc::new(Cell::new(0)),
            }
        }

        /// Appends a `recv` that returns no bytes without ending the stream.
        #[must_use]
        pub fn then_idle(mut self) -> Self {
            self.script.push_back(Step::Idle);
            self
        }

        /// Appends a `recv` that fails with `kind`.
        #[must_use]
        pub fn then_fail(mut self, kind: io::ErrorKind) -> Self {
            self.script.push_back(Step::Fail(kind));
            self
        }

        /// Appends more chunks.
        #[must_use]
        pub fn then_bytes(mut self, bytes: impl AsRef<[u8]>) -> Self {
            self.script.push_back(Step::Bytes(bytes.as_ref().to_vec()));
            self
        }

        /// Everything passed to `send` so far.
        #[must_use]
        pub fn sent(&self) -> &[u8] {
            &self.sent
        }

        /// Shared counter of `close` calls, readable after the transport has
        /// been moved or dropped.
        #[must_use]
        pub fn close_counter(&self) -> Rc<Cell<usize>> {
            Rc::clone(&self.closes)
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.sent.extend_from_slice(bytes);
            Ok(())
        }

        fn recv(&mut self, buf: &mut [u8]) -> io::Result<ReadOutcome> {
            match self.script.pop_front() {
                None => Ok(ReadOutcome::EndOfStream),
                Some(Step::Idle) => Ok(ReadOutcome::Data(0)),
                Some(Step::Fail(kind)) => Err(kind.into()),
                Some(Step::Bytes(bytes)) => {
                    let n = buf.len().min(bytes.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    if n < bytes.len() {
                        self.script.push_front(Step::Bytes(bytes[n..].to_vec()));
                    }
                    Ok(ReadOutcome::Data(n))
                }
            }
        }

        fn close(&mut self) -> io::Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use quickcheck_macros::quickcheck;

    use super::{produce_chunks, split_by};

    #[test]
    fn produce_chunks_cuts_through_characters() {
        let payload = "a€b".as_bytes();
        let chunks = produce_chunks(payload, 5);
        assert_eq!(
            chunks,
            [&b"a"[..], &b"\xE2"[..], &b"\x82"[..], &b"\xAC"[..], &b"b"[..]]
        );
        assert_eq!(chunks.concat(), payload);
    }

    #[test]
    fn split_by_consumes_whole_payload() {
        let payload = b"0123456789";
        let chunks = split_by(payload, &[2, 100, 0]);
        assert_eq!(chunks, [&b"012"[..], &b"345"[..], &b"6"[..], &b"789"[..]]);

        let chunks = split_by(payload, &[0, 0]);
        assert_eq!(chunks, [&b"0"[..], &b"1"[..], &b"23456789"[..]]);

        assert!(split_by(b"", &[1, 2]).is_empty());
    }

    #[test]
    fn split_by_borrows_only_the_payload() {
        let payload = b"abcdef";
        let chunks = {
            let splits = vec![1, 1];
            split_by(payload, &splits)
        };
        assert_eq!(chunks, [&b"ab"[..], &b"cd"[..], &b"ef"[..]]);
    }

    #[allow(clippy::needless_pass_by_value)]
    #[quickcheck]
    fn split_by_keeps_every_byte(payload: Vec<u8>, splits: Vec<usize>) -> bool {
        let chunks = split_by(&payload, &splits);
        chunks.iter().all(|c| !c.is_empty()) && chunks.concat() == payload
    }
}
