//! Bounded working buffer for raw transport bytes.
//!
//! A [`ByteChunk`] is split into three regions:
//!
//! ```text
//! 0 ........ consumed ........ filled ........ capacity
//! | drained  |     unread      |     spare     |
//! ```
//!
//! Transports write into the spare region and commit the bytes with
//! [`ByteChunk::commit`]. The decoder reads the unread region and advances the
//! read cursor with [`ByteChunk::consume`]. [`ByteChunk::compact`] moves
//! whatever is still unread to the front so the next transport read appends
//! after it.

use alloc::{boxed::Box, vec};
use core::fmt;

use bstr::BStr;

/// Fixed-capacity byte buffer with a read cursor and a fill cursor.
pub struct ByteChunk {
    data: Box<[u8]>,
    consumed: usize,
    filled: usize,
}

impl ByteChunk {
    /// Allocates a chunk that holds at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "byte chunk capacity must be at least 1");
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            consumed: 0,
            filled: 0,
        }
    }

    /// Total number of bytes the chunk can hold.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes written but not yet consumed.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.filled - self.consumed
    }

    /// Returns `true` when there are no unread bytes.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filled == self.consumed
    }

    /// Returns `true` when no more bytes can be written without compacting.
    #[must_use]
    #[inline]
    pub fn is_full(&self) -> bool {
        self.filled == self.data.len()
    }

    /// Bytes written by the transport that the decoder has not consumed yet.
    #[must_use]
    #[inline]
    pub fn unread(&self) -> &[u8] {
        &self.data[self.consumed..self.filled]
    }

    /// Writable tail of the chunk. Bytes written here become visible after
    /// [`commit`](Self::commit).
    #[inline]
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.filled..]
    }

    /// Marks `n` bytes of the spare region as written.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the spare region.
    #[inline]
    pub fn commit(&mut self, n: usize) {
        assert!(
            n <= self.data.len() - self.filled,
            "commit of {n} bytes overflows the spare region"
        );
        self.filled += n;
    }

    /// Advances the read cursor past `n` unread bytes.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds the unread region.
    #[inline]
    pub fn consume(&mut self, n: usize) {
        assert!(
            n <= self.len(),
            "consume of {n} bytes overruns {} unread",
            self.len()
        );
        self.consumed += n;
    }

    /// Appends as much of `bytes` as fits, returning the number copied.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> usize {
        let spare = self.spare_mut();
        let n = spare.len().min(bytes.len());
        spare[..n].copy_from_slice(&bytes[..n]);
        self.commit(n);
        n
    }

    /// Moves the unread bytes to the front of the chunk.
    ///
    /// After compaction the read cursor is zero and the spare region is as
    /// large as it can be.
    pub fn compact(&mut self) {
        if self.consumed == 0 {
            return;
        }
        self.data.copy_within(self.consumed..self.filled, 0);
        self.filled -= self.consumed;
        self.consumed = 0;
    }

    /// Drops all buffered bytes.
    pub fn clear(&mut self) {
        self.consumed = 0;
        self.filled = 0;
    }
}

impl fmt::Debug for ByteChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteChunk")
            .field("capacity", &self.capacity())
            .field("consumed", &self.consumed)
            .field("filled", &self.filled)
            .field("unread", &BStr::new(self.unread()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::ByteChunk;

    #[test]
    fn fill_consume_compact() {
        let mut chunk = ByteChunk::with_capacity(8);
        assert!(chunk.is_empty());
        assert_eq!(chunk.extend_from_slice(b"abcdefghij"), 8);
        assert!(chunk.is_full());
        assert_eq!(chunk.unread(), b"abcdefgh");

        chunk.consume(6);
        assert_eq!(chunk.unread(), b"gh");
        assert!(chunk.spare_mut().is_empty());

        chunk.compact();
        assert_eq!(chunk.unread(), b"gh");
        assert_eq!(chunk.spare_mut().len(), 6);
        assert_eq!(chunk.extend_from_slice(b"ij"), 2);
        assert_eq!(chunk.unread(), b"ghij");
    }

    #[test]
    fn compact_when_drained_resets_cursors() {
        let mut chunk = ByteChunk::with_capacity(4);
        chunk.extend_from_slice(b"wxyz");
        chunk.consume(4);
        chunk.compact();
        assert!(chunk.is_empty());
        assert!(!chunk.is_full());
        assert_eq!(chunk.spare_mut().len(), 4);
    }

    #[test]
    fn debug_shows_unread_as_text() {
        let mut chunk = ByteChunk::with_capacity(4);
        chunk.extend_from_slice(b"ok\xFF");
        let rendered = format!("{chunk:?}");
        assert!(rendered.contains(r#"unread: "ok\xff""#), "{rendered}");
    }

    #[test]
    #[should_panic(expected = "overruns")]
    fn consume_past_unread_panics() {
        let mut chunk = ByteChunk::with_capacity(2);
        chunk.extend_from_slice(b"a");
        chunk.consume(2);
    }

    #[test]
    #[should_panic(expected = "at least 1")]
    fn zero_capacity_panics() {
        let _ = ByteChunk::with_capacity(0);
    }
}
