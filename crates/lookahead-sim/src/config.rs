//! Simulation settings, loadable from JSON.

use anyhow::{bail, Context, Result};
use lookahead_core::{FrameGeometry, TimeRange, Timebase};
use lookahead_queue::{FrameFlags, LookaheadConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Switch the capture size starting at a given frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionChange {
    pub at_frame: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub queue: LookaheadConfig,
    /// Geometry the queue is created with and capture starts at.
    pub initial: FrameGeometry,
    pub frames: u64,
    pub fps_num: i64,
    pub fps_den: i64,
    pub timebase: Timebase,
    /// Every n-th frame is flagged as a forced keyframe. 0 disables.
    pub keyframe_interval: u64,
    /// Every n-th frame that is not a keyframe is flagged as never used for
    /// reference. 0 disables.
    pub non_reference_interval: u64,
    pub resolution_changes: Vec<ResolutionChange>,
    /// Frames the capture thread may run ahead of the encoder.
    pub channel_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            queue: LookaheadConfig::with_depth(8),
            initial: FrameGeometry::yuv420(640, 360),
            frames: 120,
            fps_num: 30,
            fps_den: 1,
            timebase: Timebase::mpeg(),
            keyframe_interval: 60,
            non_reference_interval: 3,
            resolution_changes: vec![
                ResolutionChange {
                    at_frame: 40,
                    width: 320,
                    height: 180,
                },
                ResolutionChange {
                    at_frame: 70,
                    width: 640,
                    height: 360,
                },
                ResolutionChange {
                    at_frame: 100,
                    width: 960,
                    height: 540,
                },
            ],
            channel_capacity: 4,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.queue.validate()?;
        self.initial.validate()?;
        self.timebase.validate()?;
        if self.fps_num <= 0 || self.fps_den <= 0 {
            bail!("invalid frame rate {}/{}", self.fps_num, self.fps_den);
        }
        // The last frame ends latest; if its timestamp fits, all of them do.
        self.frame_time(self.frames)
            .context("stream too long for the timebase")?;
        if self.channel_capacity == 0 {
            bail!("channel_capacity must be at least 1");
        }
        for change in &self.resolution_changes {
            self.initial
                .with_size(change.width, change.height)
                .validate()
                .with_context(|| format!("resolution change at frame {}", change.at_frame))?;
        }
        Ok(())
    }

    /// Presentation interval of `frame` in timebase ticks.
    pub fn frame_time(&self, frame: u64) -> Result<TimeRange> {
        let start = self.tick(frame)?;
        let end = self.tick(frame.saturating_add(1))?;
        Ok(TimeRange::new(start, end))
    }

    fn tick(&self, frame: u64) -> Result<i64> {
        let index = i64::try_from(frame)?;
        match self.timebase.frame_start(index, self.fps_num, self.fps_den) {
            Some(tick) => Ok(tick),
            None => bail!(
                "frame {} at {}/{} fps is not representable in timebase {}",
                frame,
                self.fps_num,
                self.fps_den,
                self.timebase
            ),
        }
    }

    /// Encode flags the capture stage attaches to `frame`.
    pub fn flags_at(&self, frame: u64) -> FrameFlags {
        let every = |n: u64| n > 0 && frame % n == 0;
        if every(self.keyframe_interval) {
            FrameFlags::FORCE_KEYFRAME
        } else if every(self.non_reference_interval) {
            FrameFlags::NO_REFERENCE
        } else {
            FrameFlags::NONE
        }
    }

    /// Capture geometry in effect for `frame`.
    pub fn geometry_at(&self, frame: u64) -> FrameGeometry {
        self.resolution_changes
            .iter()
            .filter(|c| c.at_frame <= frame)
            .max_by_key(|c| c.at_frame)
            .map(|c| self.initial.with_size(c.width, c.height))
            .unwrap_or(self.initial)
    }
}
