//! Time-to-scale keyframe samples and interpolation.

use serde::{Deserialize, Serialize};

/// One `(time, scale)` sample in clip-local seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleKeyframe {
    pub time: f64,
    pub scale: f64,
}

impl ScaleKeyframe {
    pub fn new(time: f64, scale: f64) -> Self {
        Self { time, scale }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum KeyframeError {
    #[error("Keyframe track is empty")]
    Empty,

    #[error("Keyframe {index} has a non-finite value (time={time}, scale={scale})")]
    NonFinite { index: usize, time: f64, scale: f64 },
}

/// Immutable, time-sorted keyframe list.
///
/// Sorting happens once at construction. Samples sharing a time keep their
/// input order, so a later duplicate wins when sampling past that time.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack {
    frames: Vec<ScaleKeyframe>,
}

impl KeyframeTrack {
    pub fn new(mut frames: Vec<ScaleKeyframe>) -> Result<Self, KeyframeError> {
        if frames.is_empty() {
            return Err(KeyframeError::Empty);
        }
        if let Some((index, kf)) = frames
            .iter()
            .enumerate()
            .find(|(_, kf)| !kf.time.is_finite() || !kf.scale.is_finite())
        {
            return Err(KeyframeError::NonFinite {
                index,
                time: kf.time,
                scale: kf.scale,
            });
        }
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &[ScaleKeyframe] {
        &self.frames
    }

    /// Scale at clip-local time `t`.
    ///
    /// Clamps to the first/last sample outside the sampled range and
    /// interpolates linearly between the bracketing pair inside it.
    pub fn sample(&self, t: f64) -> f64 {
        let first = self.frames[0];
        let last = self.frames[self.frames.len() - 1];
        if t <= first.time {
            return first.scale;
        }
        if t >= last.time {
            return last.scale;
        }

        // First sample strictly after t; guaranteed in 1..len by the checks above.
        let hi = self.frames.partition_point(|kf| kf.time <= t);
        let a = self.frames[hi - 1];
        let b = self.frames[hi];
        let span = b.time - a.time;
        if span <= 0.0 {
            return a.scale;
        }
        let u = (t - a.time) / span;
        a.scale + (b.scale - a.scale) * u
    }
}
