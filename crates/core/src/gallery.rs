//! Cyclic image gallery navigation.

/// Position within a fixed, ordered sequence of images.
///
/// Navigation wraps at both ends. An empty gallery stays at index 0 and
/// ignores navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gallery {
    len: usize,
    index: usize,
}

impl Gallery {
    /// Create a gallery over `len` images, starting at the first.
    #[must_use]
    pub const fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    /// Create a gallery positioned at `index`.
    ///
    /// Out-of-range indexes (e.g., a stale `?image=` query) fall back to 0.
    #[must_use]
    pub const fn at(len: usize, index: usize) -> Self {
        let index = if index < len { index } else { 0 };
        Self { len, index }
    }

    /// Number of images.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no images.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current index.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Whether navigation controls are worth showing.
    #[must_use]
    pub const fn has_multiple(&self) -> bool {
        self.len > 1
    }

    /// Index `next()` would move to.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        if self.len == 0 || self.index + 1 == self.len {
            0
        } else {
            self.index + 1
        }
    }

    /// Index `previous()` would move to.
    #[must_use]
    pub const fn previous_index(&self) -> usize {
        if self.len == 0 {
            0
        } else if self.index == 0 {
            self.len - 1
        } else {
            self.index - 1
        }
    }

    /// Advance one image, wrapping to the first after the last.
    pub const fn next(&mut self) {
        self.index = self.next_index();
    }

    /// Go back one image, wrapping to the last before the first.
    pub const fn previous(&mut self) {
        self.index = self.previous_index();
    }

    /// Jump to an image. Out-of-range indexes are ignored.
    pub const fn go_to(&mut self, index: usize) {
        if index < self.len {
            self.index = index;
        }
    }
}
