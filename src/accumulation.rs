//! Temporal accumulation bookkeeping.
//!
//! After anything that changes what a pixel shows, the previous frame's
//! buffer no longer matches the new image. Blending is held off for
//! [`SUPPRESSED_FRAMES`] frames: the first frame where the change is visible
//! and one more for the buffer swap lag.

/// Frames rendered without history after an invalidation.
pub const SUPPRESSED_FRAMES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulationState {
    Blending,
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct AccumulationController {
    rendered_frame_count: u32,
    skip_blend_frames: u32,
    /// Samples averaged into the history buffer
    history_samples: u32,
    temporal_aa: bool,
}

impl AccumulationController {
    pub fn new(temporal_aa: bool) -> Self {
        Self {
            rendered_frame_count: 0,
            skip_blend_frames: SUPPRESSED_FRAMES,
            history_samples: 0,
            temporal_aa,
        }
    }

    /// Drop the accumulated history.
    pub fn invalidate(&mut self) {
        if self.rendered_frame_count > 0 || self.skip_blend_frames == 0 {
            tracing::debug!(
                frames = self.rendered_frame_count,
                "accumulation invalidated"
            );
        }
        self.rendered_frame_count = 0;
        self.skip_blend_frames = SUPPRESSED_FRAMES;
        self.history_samples = 0;
    }

    /// Decide whether this frame blends with history. Call once per render.
    pub fn tick(&mut self) -> bool {
        let blend = if self.skip_blend_frames > 0 {
            self.skip_blend_frames -= 1;
            false
        } else {
            self.temporal_aa
        };
        self.rendered_frame_count = self.rendered_frame_count.saturating_add(1);
        // an unblended frame overwrites the history with a single sample
        self.history_samples = if blend {
            self.history_samples.saturating_add(1)
        } else {
            1
        };
        blend
    }

    pub fn state(&self) -> AccumulationState {
        if self.skip_blend_frames > 0 {
            AccumulationState::Suppressed
        } else {
            AccumulationState::Blending
        }
    }

    /// Frames rendered since the last invalidation.
    pub fn rendered_frame_count(&self) -> u32 {
        self.rendered_frame_count
    }

    /// Samples in the history the next blended frame averages with; weight
    /// the new sample by `1 / (history_samples + 1)`.
    pub fn history_samples(&self) -> u32 {
        self.history_samples
    }

    pub fn temporal_aa(&self) -> bool {
        self.temporal_aa
    }

    /// Change the user preference. Invalidates when it actually changes.
    pub fn set_temporal_aa(&mut self, enabled: bool) {
        if self.temporal_aa != enabled {
            self.temporal_aa = enabled;
            self.invalidate();
        }
    }
}

impl Default for AccumulationController {
    fn default() -> Self {
        Self::new(true)
    }
}
