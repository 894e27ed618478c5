//! Circular slot positions.

/// A position in a ring of `len` slots.
///
/// All wraparound arithmetic for the queue lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotIndex {
    pos: usize,
    len: usize,
}

impl SlotIndex {
    /// Position 0 in a ring of `len` slots. `len` must be non-zero.
    pub fn new(len: usize) -> Self {
        debug_assert!(len > 0, "ring must have at least one slot");
        Self { pos: 0, len }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.pos
    }

    /// Move to the next slot, wrapping at the end of the ring.
    #[inline]
    pub fn advance(&mut self) {
        self.pos += 1;
        if self.pos >= self.len {
            self.pos -= self.len;
        }
    }

    /// Slot `delta` positions away, wrapping in either direction.
    #[inline]
    pub fn offset(self, delta: isize) -> usize {
        let len = self.len as isize;
        (self.pos as isize + delta % len).rem_euclid(len) as usize
    }
}
