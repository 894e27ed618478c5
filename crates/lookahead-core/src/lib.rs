//! Look-ahead Core - picture buffers for the encoder look-ahead queue
//!
//! This crate provides the types the queue stores and hands out:
//! - Frame geometry and the plane layout rule (alignment, borders, strides)
//! - Bordered YUV picture buffers with in-place reshape
//! - Tick timestamps and timebases

pub mod error;
pub mod geometry;
pub mod picture;
pub mod time;

pub use error::{LookaheadError, Result};
pub use geometry::{
    align_power_of_two, FrameGeometry, PictureLayout, PlaneKind, PlaneLayout, SampleDepth,
};
pub use picture::{PictureBuffer, Plane, Samples};
pub use time::{TimeRange, Timebase};
