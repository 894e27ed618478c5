//! Queue entries.

use lookahead_core::{PictureBuffer, TimeRange};
use serde::{Deserialize, Serialize};

/// Per-frame encode flags supplied by the application. The queue stores them
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FrameFlags(pub u32);

impl FrameFlags {
    pub const NONE: Self = Self(0);
    /// Force this frame to be coded as a keyframe.
    pub const FORCE_KEYFRAME: Self = Self(1);
    /// Do not use this frame as a reference.
    pub const NO_REFERENCE: Self = Self(1 << 16);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for FrameFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// One slot of the queue: a picture and the metadata stamped on it when it
/// was pushed.
#[derive(Debug)]
pub struct LookaheadFrame {
    pub(crate) picture: PictureBuffer,
    pub(crate) time: TimeRange,
    pub(crate) flags: FrameFlags,
    pub(crate) display_index: u64,
    /// False until the first push lands in this slot.
    pub(crate) filled: bool,
}

impl LookaheadFrame {
    pub(crate) fn empty(picture: PictureBuffer) -> Self {
        Self {
            picture,
            time: TimeRange::default(),
            flags: FrameFlags::NONE,
            display_index: 0,
            filled: false,
        }
    }

    #[inline]
    pub fn picture(&self) -> &PictureBuffer {
        &self.picture
    }

    #[inline]
    pub fn ts_start(&self) -> i64 {
        self.time.start
    }

    #[inline]
    pub fn ts_end(&self) -> i64 {
        self.time.end
    }

    #[inline]
    pub fn time_range(&self) -> TimeRange {
        self.time
    }

    #[inline]
    pub fn flags(&self) -> FrameFlags {
        self.flags
    }

    /// Position of this frame in display order, counted from the first push.
    #[inline]
    pub fn display_index(&self) -> u64 {
        self.display_index
    }
}
