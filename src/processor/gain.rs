use crate::audio::buffer::{AudioBufferMut, StereoBufferMut};

/// A fixed linear gain stage.
pub struct Gain {
    level: f32,
}

impl Gain {
    pub fn new(level: f32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Scales a stereo buffer in place.
    pub fn apply(&self, audio: StereoBufferMut) {
        audio.left.scale(self.level);
        audio.right.scale(self.level);
    }
}
