//! Synthetic capture stage running on its own thread.

use crate::config::SimConfig;
use anyhow::{anyhow, Result};
use crossbeam_channel::Sender;
use lookahead_core::{PictureBuffer, TimeRange};
use lookahead_queue::FrameFlags;
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// A frame handed from capture to the encoder.
pub struct CapturedFrame {
    pub picture: PictureBuffer,
    pub time: TimeRange,
    pub flags: FrameFlags,
}

/// Produce `config.frames` test-pattern frames on a background thread.
///
/// The bounded channel blocks the producer whenever the encoder falls
/// behind. Returns the number of frames sent.
pub fn spawn(config: SimConfig, tx: Sender<CapturedFrame>) -> JoinHandle<Result<u64>> {
    thread::spawn(move || {
        let mut current = config.initial;
        for index in 0..config.frames {
            let geometry = config.geometry_at(index);
            if geometry != current {
                info!(
                    frame = index,
                    width = geometry.width,
                    height = geometry.height,
                    "capture resolution changed"
                );
                current = geometry;
            }

            // Source frames carry no border; the queue adds its own.
            let picture = PictureBuffer::test_pattern(geometry, 0, index as u32)?;
            let time = config.frame_time(index)?;
            let flags = config.flags_at(index);

            tx.send(CapturedFrame {
                picture,
                time,
                flags,
            })
            .map_err(|_| anyhow!("encoder hung up after {} frames", index))?;
            debug!(frame = index, "captured");
        }
        Ok(config.frames)
    })
}
