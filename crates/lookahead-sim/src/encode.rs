//! Encoder front-end: feeds the look-ahead queue and commits frames once
//! enough future context is buffered.
//!
//! Stands in for the analysis and rate-control stages. For every committed
//! frame it looks at the forward window and the previously committed frame,
//! which is all those stages ask of the queue.

use crate::capture::CapturedFrame;
use anyhow::{bail, Result};
use crossbeam_channel::Receiver;
use lookahead_core::{LookaheadError, PlaneKind};
use lookahead_queue::{FrameFlags, LookaheadQueue, QueueState, QueueStats};
use serde::Serialize;
use tracing::{debug, info};

/// What analysis saw when a frame was committed.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub display_index: u64,
    pub ts_start: i64,
    pub width: u32,
    pub height: u32,
    /// Frames visible at commit time, the committed one included.
    pub lookahead: usize,
    pub luma_mean: f64,
    pub window_luma_mean: f64,
    /// Luma mean change against the previously committed frame.
    pub temporal_delta: Option<f64>,
    pub keyframe: bool,
    /// Later frames may predict from this one.
    pub reference: bool,
    pub drained: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EncodeSummary {
    pub encoded: u64,
    pub drained: u64,
    pub keyframes: u64,
    pub non_reference: u64,
    pub max_depth: usize,
    pub in_display_order: bool,
    pub allocated_bytes: usize,
    pub stats: QueueStats,
}

pub struct Encoder {
    queue: LookaheadQueue,
    reports: Vec<FrameReport>,
    max_depth: usize,
}

impl Encoder {
    pub fn new(queue: LookaheadQueue) -> Self {
        Self {
            queue,
            reports: Vec::new(),
            max_depth: 0,
        }
    }

    /// Queue one captured frame, committing the oldest one if the window is
    /// complete.
    pub fn submit(&mut self, frame: &CapturedFrame) -> Result<()> {
        let high_bit_depth = frame.picture.depth().is_high();
        loop {
            match self.queue.push(
                &frame.picture,
                frame.time.start,
                frame.time.end,
                high_bit_depth,
                frame.flags,
            ) {
                Ok(()) => break,
                Err(LookaheadError::QueueFull) => {
                    if !self.encode_next(false) {
                        bail!("look-ahead full but no frame could be committed");
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
        self.max_depth = self.max_depth.max(self.queue.depth());

        if self.queue.state() == QueueState::Ready {
            self.encode_next(false);
        }
        Ok(())
    }

    /// Commit everything left at end of stream.
    pub fn flush(&mut self) {
        let mut drained = 0;
        while self.encode_next(true) {
            drained += 1;
        }
        info!(frames = drained, "drained look-ahead");
    }

    fn encode_next(&mut self, drain: bool) -> bool {
        let ready = self.queue.state() == QueueState::Ready;
        if self.queue.is_empty() || !(drain || ready) {
            return false;
        }
        let Some(report) = self.analyze(drain && !ready) else {
            return false;
        };
        let Some(frame) = self.queue.pop(drain) else {
            return false;
        };
        debug_assert_eq!(frame.display_index(), report.display_index);

        debug!(
            display_index = report.display_index,
            lookahead = report.lookahead,
            luma = report.luma_mean,
            drained = report.drained,
            "committed frame"
        );
        self.reports.push(report);
        true
    }

    fn analyze(&self, drained: bool) -> Option<FrameReport> {
        let current = self.queue.peek(0)?;
        let picture = current.picture();
        let luma_mean = picture.plane(PlaneKind::Y).mean();

        let window: Vec<f64> = self
            .queue
            .iter()
            .map(|f| f.picture().plane(PlaneKind::Y).mean())
            .collect();
        let window_luma_mean = window.iter().sum::<f64>() / window.len() as f64;

        let temporal_delta = self
            .queue
            .peek(-1)
            .map(|prev| luma_mean - prev.picture().plane(PlaneKind::Y).mean());

        Some(FrameReport {
            display_index: current.display_index(),
            ts_start: current.ts_start(),
            width: picture.geometry().width,
            height: picture.geometry().height,
            lookahead: window.len(),
            luma_mean,
            window_luma_mean,
            temporal_delta,
            keyframe: current.flags().contains(FrameFlags::FORCE_KEYFRAME),
            reference: !current.flags().contains(FrameFlags::NO_REFERENCE),
            drained,
        })
    }

    pub fn reports(&self) -> &[FrameReport] {
        &self.reports
    }

    pub fn summary(&self) -> EncodeSummary {
        let in_display_order = self
            .reports
            .iter()
            .enumerate()
            .all(|(i, r)| r.display_index == i as u64);
        EncodeSummary {
            encoded: self.reports.len() as u64,
            drained: self.reports.iter().filter(|r| r.drained).count() as u64,
            keyframes: self.reports.iter().filter(|r| r.keyframe).count() as u64,
            non_reference: self.reports.iter().filter(|r| !r.reference).count() as u64,
            max_depth: self.max_depth,
            in_display_order,
            allocated_bytes: self.queue.allocated_bytes(),
            stats: self.queue.stats(),
        }
    }
}

/// Consume captured frames until the channel closes, then drain.
pub fn run(queue: LookaheadQueue, rx: Receiver<CapturedFrame>) -> Result<Encoder> {
    let mut encoder = Encoder::new(queue);
    for frame in rx.iter() {
        encoder.submit(&frame)?;
    }
    encoder.flush();
    Ok(encoder)
}
