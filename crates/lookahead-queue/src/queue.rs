//! Fixed-capacity circular queue of source pictures.
//!
//! The encoder pushes frames as they arrive and pops them once enough future
//! frames are buffered to look ahead. Slots are never freed while the queue
//! lives; a push recycles the slot at the write position, reallocating it
//! only when the new frame does not fit.
//!
//! ```text
//!            retained   look-ahead window (depth)
//!              ┌───┐ ┌───┬───┬───┬───┐
//!   slots ...  │-1 │ │ 0 │ 1 │ 2 │ 3 │  ...
//!              └───┘ └───┴───┴───┴───┘
//!                      ▲ read          ▲ write
//! ```
//!
//! Frames returned by [`pop`](LookaheadQueue::pop) and
//! [`peek`](LookaheadQueue::peek) are borrowed from the queue, so the borrow
//! checker keeps them from outliving the next push. Between pushes, the last
//! `RETENTION_MARGIN` popped frames stay readable through negative peek
//! offsets.

use crate::config::LookaheadConfig;
use crate::frame::{FrameFlags, LookaheadFrame};
use crate::index::SlotIndex;
use crate::slot::SlotAction;
use crate::RETENTION_MARGIN;
use lookahead_core::{
    FrameGeometry, LookaheadError, PictureBuffer, Result, SampleDepth, TimeRange,
};
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Occupancy phase of the queue.
///
/// Draining is not a state of its own: it is the caller passing
/// `drain = true` to [`LookaheadQueue::pop`] while `Filling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Empty,
    /// Holding frames, below the ready threshold.
    Filling,
    /// Look-ahead window fully populated; non-draining pops succeed.
    Ready,
}

/// Counters kept per queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pushed: u64,
    pub rejected_full: u64,
    pub popped: u64,
    pub reshaped: u64,
    pub reallocated: u64,
    pub allocation_failures: u64,
}

/// Bounded look-ahead queue of picture buffers.
pub struct LookaheadQueue {
    slots: Box<[LookaheadFrame]>,
    count: usize,
    write: SlotIndex,
    read: SlotIndex,
    next_display_index: u64,
    config: LookaheadConfig,
    allocated_bytes: usize,
    stats: QueueStats,
}

impl LookaheadQueue {
    /// Create a queue for frames of the given size, preallocating every slot
    /// with the default border.
    pub fn new(
        width: u32,
        height: u32,
        subsampling_x: u8,
        subsampling_y: u8,
        high_bit_depth: bool,
        depth: usize,
    ) -> Result<Self> {
        let geometry = FrameGeometry::new(
            width,
            height,
            subsampling_x,
            subsampling_y,
            SampleDepth::from_high_bit_depth(high_bit_depth),
        );
        Self::with_config(geometry, LookaheadConfig::with_depth(depth))
    }

    /// Create a queue from an explicit configuration.
    ///
    /// Either every slot is allocated or none is: on failure the slots built
    /// so far are dropped before the error is returned.
    pub fn with_config(geometry: FrameGeometry, config: LookaheadConfig) -> Result<Self> {
        config.validate()?;
        geometry.validate()?;
        let max_size = config.max_size();

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(max_size)
            .map_err(|_| LookaheadError::AllocationFailure {
                bytes: max_size.saturating_mul(std::mem::size_of::<LookaheadFrame>()),
            })?;

        let mut allocated_bytes = 0usize;
        for i in 0..max_size {
            let picture = match allocate_picture(
                &geometry,
                config.border,
                allocated_bytes,
                config.memory_budget,
            ) {
                Ok(picture) => picture,
                Err(err) => {
                    warn!(slot = i, slots = max_size, error = %err, "look-ahead allocation failed");
                    return Err(err);
                }
            };
            allocated_bytes += picture.memory_size();
            slots.push(LookaheadFrame::empty(picture));
        }

        debug!(
            width = geometry.width,
            height = geometry.height,
            depth = config.effective_depth(),
            slots = max_size,
            bytes = allocated_bytes,
            "look-ahead queue created"
        );

        Ok(Self {
            slots: slots.into_boxed_slice(),
            count: 0,
            write: SlotIndex::new(max_size),
            read: SlotIndex::new(max_size),
            next_display_index: 0,
            config,
            allocated_bytes,
            stats: QueueStats::default(),
        })
    }

    /// Copy `source` into the next free slot.
    ///
    /// Fails with [`LookaheadError::QueueFull`] when no slot is free, and
    /// with [`LookaheadError::AllocationFailure`] when the slot has to grow
    /// and cannot. Either way the queue is unchanged: occupancy, write
    /// position and the display counter only move once the frame is stored.
    pub fn push(
        &mut self,
        source: &PictureBuffer,
        ts_start: i64,
        ts_end: i64,
        high_bit_depth: bool,
        flags: FrameFlags,
    ) -> Result<()> {
        if self.is_full() {
            self.stats.rejected_full += 1;
            trace!(depth = self.count, "look-ahead full, push rejected");
            return Err(LookaheadError::QueueFull);
        }

        let incoming = *source.geometry();
        if incoming.depth.is_high() != high_bit_depth {
            return Err(LookaheadError::InvalidGeometry(format!(
                "high_bit_depth is {} but source samples are {:?}",
                high_bit_depth, incoming.depth
            )));
        }

        let pos = self.write.get();
        match SlotAction::decide(&self.slots[pos].picture, &incoming) {
            SlotAction::Reuse => {}
            SlotAction::Reshape => {
                self.slots[pos].picture.reshape(incoming)?;
                self.stats.reshaped += 1;
                debug!(
                    slot = pos,
                    width = incoming.width,
                    height = incoming.height,
                    "reshaped slot in place"
                );
            }
            SlotAction::GrowReplace => self.grow_slot(pos, &incoming)?,
        }

        let slot = &mut self.slots[pos];
        slot.picture.copy_and_extend_from(source)?;
        slot.time = TimeRange::new(ts_start, ts_end);
        slot.flags = flags;
        slot.display_index = self.next_display_index;
        slot.filled = true;

        self.next_display_index += 1;
        self.count += 1;
        self.write.advance();
        self.stats.pushed += 1;

        trace!(
            slot = pos,
            display_index = self.next_display_index - 1,
            depth = self.count,
            "pushed frame"
        );
        Ok(())
    }

    fn grow_slot(&mut self, pos: usize, geometry: &FrameGeometry) -> Result<()> {
        let old_bytes = self.slots[pos].picture.memory_size();
        let in_use = self.allocated_bytes - old_bytes;
        let picture = match allocate_picture(
            geometry,
            self.config.border,
            in_use,
            self.config.memory_budget,
        ) {
            Ok(picture) => picture,
            Err(err) => {
                self.stats.allocation_failures += 1;
                warn!(slot = pos, error = %err, "could not grow look-ahead slot");
                return Err(err);
            }
        };

        self.allocated_bytes = in_use + picture.memory_size();
        let old = std::mem::replace(&mut self.slots[pos].picture, picture);
        self.stats.reallocated += 1;
        debug!(
            slot = pos,
            from_width = old.capacity().width,
            from_height = old.capacity().height,
            width = geometry.width,
            height = geometry.height,
            "reallocated slot"
        );
        Ok(())
    }

    /// Take the oldest frame.
    ///
    /// Returns `None` when empty, or when below the ready threshold and
    /// `drain` is false. Pass `drain = true` at end of stream to flush the
    /// remaining frames.
    pub fn pop(&mut self, drain: bool) -> Option<&LookaheadFrame> {
        if self.count == 0 || !(drain || self.count == self.ready_threshold()) {
            return None;
        }
        let pos = self.read.get();
        self.read.advance();
        self.count -= 1;
        self.stats.popped += 1;

        let frame = &self.slots[pos];
        trace!(
            slot = pos,
            display_index = frame.display_index,
            drain,
            "popped frame"
        );
        Some(frame)
    }

    /// Look at a frame relative to the read position without consuming it.
    ///
    /// `offset >= 0` addresses queued frames, `0` being what `pop` would
    /// return. Negative offsets down to `-RETENTION_MARGIN` address frames
    /// already popped. Anything else, or a slot that never held a frame,
    /// yields `None`.
    pub fn peek(&self, offset: isize) -> Option<&LookaheadFrame> {
        let in_range = if offset >= 0 {
            (offset as usize) < self.count
        } else {
            offset.unsigned_abs() <= RETENTION_MARGIN
        };
        if !in_range {
            return None;
        }
        let frame = &self.slots[self.read.offset(offset)];
        frame.filled.then_some(frame)
    }

    /// The frame `n` positions ahead of the read position.
    pub fn peek_forward(&self, n: usize) -> Option<&LookaheadFrame> {
        isize::try_from(n).ok().and_then(|offset| self.peek(offset))
    }

    /// The frame popped `n` pops ago (`n >= 1`).
    pub fn peek_backward(&self, n: usize) -> Option<&LookaheadFrame> {
        if n == 0 {
            return None;
        }
        isize::try_from(n).ok().and_then(|offset| self.peek(-offset))
    }

    /// Queued frames in pop order.
    pub fn iter(&self) -> impl Iterator<Item = &LookaheadFrame> + '_ {
        (0..self.count).filter_map(move |i| self.peek_forward(i))
    }

    /// Number of frames currently queued.
    #[inline]
    pub fn depth(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether a push would be rejected for lack of space.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count + 1 + RETENTION_MARGIN > self.slots.len()
    }

    /// Display index the next pushed frame will receive.
    #[inline]
    pub fn next_display_index(&self) -> u64 {
        self.next_display_index
    }

    /// Number of slots, including the retention margin.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.slots.len()
    }

    /// Occupancy at which non-draining pops start succeeding.
    #[inline]
    pub fn ready_threshold(&self) -> usize {
        self.slots.len() - RETENTION_MARGIN
    }

    pub fn state(&self) -> QueueState {
        match self.count {
            0 => QueueState::Empty,
            n if n == self.ready_threshold() => QueueState::Ready,
            _ => QueueState::Filling,
        }
    }

    #[inline]
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Bytes of sample storage held by all slots.
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    #[inline]
    pub fn config(&self) -> &LookaheadConfig {
        &self.config
    }
}

impl std::fmt::Debug for LookaheadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookaheadQueue")
            .field("max_size", &self.slots.len())
            .field("count", &self.count)
            .field("write", &self.write.get())
            .field("read", &self.read.get())
            .field("next_display_index", &self.next_display_index)
            .field("allocated_bytes", &self.allocated_bytes)
            .finish()
    }
}

/// Allocate a picture unless doing so would push `in_use` past `budget`.
fn allocate_picture(
    geometry: &FrameGeometry,
    border: usize,
    in_use: usize,
    budget: Option<usize>,
) -> Result<PictureBuffer> {
    let bytes = PictureBuffer::required_bytes(geometry, border)?;
    if let Some(budget) = budget {
        if in_use.saturating_add(bytes) > budget {
            return Err(LookaheadError::AllocationFailure { bytes });
        }
    }
    PictureBuffer::new(*geometry, border)
}
