//! Look-ahead Queue - bounded source-frame buffer for video encoders
//!
//! Lets analysis and rate control see future frames before the oldest one
//! is committed, while keeping the most recently committed frame around for
//! backward reference.
//!
//! Architecture:
//! - `LookaheadQueue`: fixed ring of preallocated picture slots
//! - `SlotIndex`: the ring's wraparound arithmetic
//! - `SlotAction`: reuse, reshape in place, or reallocate on a size change
//! - `LookaheadConfig`: depth, border and memory budget

pub mod config;
pub mod frame;
pub mod index;
pub mod queue;
pub mod slot;

pub use config::LookaheadConfig;
pub use frame::{FrameFlags, LookaheadFrame};
pub use index::SlotIndex;
pub use queue::{LookaheadQueue, QueueState, QueueStats};
pub use slot::SlotAction;

/// Largest look-ahead depth a queue will use.
pub const MAX_LOOKAHEAD_DEPTH: usize = 25;

/// Popped frames kept addressable for backward peeks.
pub const RETENTION_MARGIN: usize = 1;

/// Default border around queued pictures, in luma pixels.
pub const ENCODER_BORDER: usize = 160;
