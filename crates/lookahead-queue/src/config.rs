//! Queue configuration.

use crate::{ENCODER_BORDER, MAX_LOOKAHEAD_DEPTH, RETENTION_MARGIN};
use lookahead_core::{LookaheadError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`LookaheadQueue`](crate::LookaheadQueue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookaheadConfig {
    /// Requested look-ahead distance in frames. Clamped to
    /// `1..=MAX_LOOKAHEAD_DEPTH`.
    pub depth: usize,
    /// Border around every picture, in luma pixels. Must be a multiple of 32.
    pub border: usize,
    /// Upper bound on bytes held by all slots together. `None` is unbounded.
    pub memory_budget: Option<usize>,
}

impl Default for LookaheadConfig {
    fn default() -> Self {
        Self {
            depth: MAX_LOOKAHEAD_DEPTH,
            border: ENCODER_BORDER,
            memory_budget: None,
        }
    }
}

impl LookaheadConfig {
    pub fn with_depth(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.border % 32 != 0 {
            return Err(LookaheadError::Config(format!(
                "border {} is not a multiple of 32",
                self.border
            )));
        }
        if self.memory_budget == Some(0) {
            return Err(LookaheadError::Config(
                "memory budget must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Depth after clamping.
    #[inline]
    pub fn effective_depth(&self) -> usize {
        self.depth.clamp(1, MAX_LOOKAHEAD_DEPTH)
    }

    /// Number of slots the queue allocates.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.effective_depth() + RETENTION_MARGIN
    }
}
