//! What a push does to the slot it lands in.

use lookahead_core::{FrameGeometry, PictureBuffer};

/// How a slot's picture is prepared for an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    /// Same geometry; copy straight in.
    Reuse,
    /// Different geometry that fits the existing storage; update crop sizes
    /// and strides in place.
    Reshape,
    /// Larger than the storage, or a different sample depth; allocate a new
    /// picture and drop the old one.
    GrowReplace,
}

impl SlotAction {
    pub fn decide(slot: &PictureBuffer, incoming: &FrameGeometry) -> Self {
        if slot.geometry() == incoming {
            Self::Reuse
        } else if slot.can_reshape_to(incoming) {
            Self::Reshape
        } else {
            Self::GrowReplace
        }
    }
}
