use crate::error::Error;

/// What the decoder does with bytes that are not valid UTF-8.
///
/// Malformed input is never an error. Each maximal invalid subsequence, and a
/// sequence still incomplete when the stream ends, is handled as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(test, feature = "serde"), serde(rename_all = "snake_case"))]
pub enum MalformedPolicy {
    /// Emit one U+FFFD REPLACEMENT CHARACTER per malformed unit.
    ///
    /// This matches [`String::from_utf8_lossy`] on the whole stream.
    #[default]
    Replace,
    /// Drop malformed units silently.
    Ignore,
}

/// Configuration for the read/decode/compact loop.
///
/// # Examples
///
/// ```rust
/// use streamtext::{MalformedPolicy, ReadOptions};
///
/// let options = ReadOptions {
///     chunk_capacity: 8,
///     malformed: MalformedPolicy::Ignore,
///     ..Default::default()
/// };
/// assert_eq!(options.scratch_capacity(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(test, feature = "serde"), serde(default))]
pub struct ReadOptions {
    /// Number of raw bytes the working buffer holds before a decode pass is
    /// forced.
    ///
    /// Any value of at least 1 decodes correctly, including values smaller
    /// than the width of a single encoded character. Smaller values only mean
    /// more read and decode passes.
    ///
    /// # Default
    ///
    /// `8192`
    pub chunk_capacity: usize,

    /// Number of characters the scratch buffer holds per decode pass.
    ///
    /// `None` uses `chunk_capacity`, which is always enough to drain a full
    /// chunk in one pass since UTF-8 never yields more characters than bytes.
    /// A smaller scratch leaves undecoded bytes in the chunk; they are moved
    /// to the front by compaction and decoded on the next pass.
    ///
    /// # Default
    ///
    /// `None`
    pub char_capacity: Option<usize>,

    /// Handling of malformed or truncated byte sequences.
    ///
    /// # Default
    ///
    /// [`MalformedPolicy::Replace`]
    pub malformed: MalformedPolicy,
}

impl ReadOptions {
    /// Default size of the working byte chunk.
    pub const DEFAULT_CHUNK_CAPACITY: usize = 8192;

    /// Scratch capacity after resolving the `char_capacity` default.
    #[must_use]
    pub fn scratch_capacity(&self) -> usize {
        self.char_capacity.unwrap_or(self.chunk_capacity)
    }

    /// Checks that both buffers can hold at least one unit.
    ///
    /// # Errors
    ///
    /// [`Error::ZeroCapacity`] naming the buffer configured with capacity 0.
    pub fn validate(&self) -> Result<(), Error> {
        if self.chunk_capacity == 0 {
            return Err(Error::ZeroCapacity { what: "chunk" });
        }
        if self.scratch_capacity() == 0 {
            return Err(Error::ZeroCapacity { what: "scratch" });
        }
        Ok(())
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            chunk_capacity: Self::DEFAULT_CHUNK_CAPACITY,
            char_capacity: None,
            malformed: MalformedPolicy::default(),
        }
    }
}

/// How a response is read off the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(test, feature = "serde"), serde(rename_all = "snake_case"))]
pub enum ReadMode {
    /// Fixed-size byte chunks decoded incrementally.
    #[default]
    Buffers,
    /// Blocking line reads. A line ends at `\n`, `\r\n` or a lone `\r`; it
    /// loses its terminator and is appended followed by a single `\n`.
    Lines,
}

/// Configuration for [`fetch`](crate::fetch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(any(test, feature = "serde"), serde(default))]
pub struct FetchOptions {
    /// Options for the decode loop. In [`ReadMode::Lines`] only `malformed`
    /// and `chunk_capacity` (used as the line reader's buffer size) apply.
    pub read: ReadOptions,
    /// I/O style used to read the response.
    ///
    /// # Default
    ///
    /// [`ReadMode::Buffers`]
    pub mode: ReadMode,
}
