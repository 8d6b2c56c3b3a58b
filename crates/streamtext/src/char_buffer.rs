use alloc::string::String;

/// Bounded scratch buffer of decoded characters.
///
/// Capacity is counted in `char`s, not bytes, so a scratch of capacity 8 holds
/// eight characters whatever their encoded width.
#[derive(Debug, Clone)]
pub struct CharBuffer {
    text: String,
    len: usize,
    capacity: usize,
}

impl CharBuffer {
    /// Creates an empty scratch that holds at most `capacity` characters.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "char buffer capacity must be at least 1");
        Self {
            // Most response text is ASCII; reserve one byte per char.
            text: String::with_capacity(capacity),
            len: 0,
            capacity,
        }
    }

    /// Maximum number of characters.
    #[must_use]
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of characters currently held.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no characters are held.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of characters that can still be pushed.
    #[must_use]
    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }

    /// Appends `c`, returning `false` without writing when full.
    #[inline]
    pub fn push(&mut self, c: char) -> bool {
        if self.len == self.capacity {
            return false;
        }
        self.text.push(c);
        self.len += 1;
        true
    }

    /// Decoded text held by the scratch.
    #[must_use]
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Resets the scratch for reuse without releasing its allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.text.clear();
        self.len = 0;
    }

    /// Appends the held text to `dst` and clears the scratch.
    pub fn drain_into(&mut self, dst: &mut String) {
        dst.push_str(&self.text);
        self.clear();
    }
}
