//! Rendering quality profile data.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::tier::Tier;

/// Frame rate the computational load metric is normalised against.
const LOAD_BASELINE_FPS: f32 = 30.0;

/// Effects multiplier when every optional layer is enabled.
const ALL_LAYERS_MULTIPLIER: f32 = 1.5;

/// Effects multiplier when some but not all optional layers are enabled.
const SOME_LAYERS_MULTIPLIER: f32 = 1.2;

/// A fully specified rendering quality profile.
///
/// Profiles are immutable values. Changing quality means publishing a
/// different profile, never mutating the active one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityProfile {
    /// Display name (e.g. "medium", "emergency").
    pub name: &'static str,

    /// Ladder tier, or `None` for profiles outside the ladder.
    pub tier: Option<Tier>,

    /// Geometry step in pixels between wave mesh vertices.
    ///
    /// Smaller steps mean denser geometry.
    pub step_size: u32,

    /// Frame rate the render loop should pace itself to.
    pub target_fps: u32,

    /// Global scalar applied to every animated effect (0.0 - 1.2).
    pub effect_intensity: f32,

    /// Atmospheric haze gradient above the horizon.
    pub atmosphere: bool,

    /// Sky reflections on the water surface.
    pub reflections: bool,

    /// Animated shimmer on wave crests.
    pub shimmer: bool,

    /// Specular sun highlights.
    pub specular: bool,
}

impl QualityProfile {
    /// Frame budget derived from the target frame rate.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.target_fps.max(1)))
    }

    /// Number of optional layers (reflections, shimmer, specular) enabled.
    pub fn optional_layer_count(&self) -> usize {
        [self.reflections, self.shimmer, self.specular]
            .iter()
            .filter(|enabled| **enabled)
            .count()
    }

    /// Multiplier reflecting how many optional layers are active.
    pub fn effects_multiplier(&self) -> f32 {
        match self.optional_layer_count() {
            3 => ALL_LAYERS_MULTIPLIER,
            0 => 1.0,
            _ => SOME_LAYERS_MULTIPLIER,
        }
    }

    /// Relative cost of rendering one second with this profile.
    ///
    /// `(1000 / step²) × (target_fps / 30) × effects × intensity`.
    /// Informational only; tier decisions never read it.
    pub fn computational_load(&self) -> f32 {
        let step = self.step_size.max(1) as f32;
        (1000.0 / (step * step))
            * (self.target_fps as f32 / LOAD_BASELINE_FPS)
            * self.effects_multiplier()
            * self.effect_intensity
    }

    /// Whether this profile sits on the adjustable tier ladder.
    pub fn is_on_ladder(&self) -> bool {
        self.tier.is_some()
    }
}

impl fmt::Display for QualityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (step {}px, {} fps, intensity {:.2}, load {:.1})",
            self.name,
            self.step_size,
            self.target_fps,
            self.effect_intensity,
            self.computational_load()
        )
    }
}
