use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::paint::Color;

pub const DEFAULT_COLORS: [&str; 4] = ["#a960ee", "#ff333d", "#90e0ff", "#ffcb57"];

/// Animated gradient mesh parameters. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BackgroundConfig {
    /// Peak vertical displacement in pixels.
    pub amplitude: f32,
    /// Multiplier on simulated time.
    pub speed: f32,
    pub freq_x: f32,
    pub freq_y: f32,
    pub seed: f32,
    pub darken_top: bool,
    pub shadow_power: f32,
    /// Base color followed by the three wave colors, as hex strings.
    pub colors: [String; 4],
    /// Upper bound on the wall-clock delta folded into simulated time.
    pub max_delta_ms: f32,
    /// Segments per pixel, horizontally and vertically.
    pub density: [f32; 2],
    /// Keep requesting renders so the gradient moves.
    pub animate: bool,
    pub grain_texture: Option<PathBuf>,
    pub grain_strength: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            amplitude: 320.0,
            speed: 1.0,
            freq_x: 14e-5,
            freq_y: 29e-5,
            seed: 5.0,
            darken_top: false,
            shadow_power: 5.0,
            colors: DEFAULT_COLORS.map(String::from),
            max_delta_ms: 66.0,
            density: [0.06, 0.16],
            animate: true,
            grain_texture: None,
            grain_strength: 0.15,
        }
    }
}

impl BackgroundConfig {
    /// Parses the control colors. An unparsable entry falls back to its default.
    pub fn resolved_colors(&self) -> [Color; 4] {
        std::array::from_fn(|i| match Color::from_hex(&self.colors[i]) {
            Ok(c) => c,
            Err(err) => {
                log::warn!("background color {i}: {err}; using {}", DEFAULT_COLORS[i]);
                Color::from_hex(DEFAULT_COLORS[i]).unwrap_or_else(|_| Color::transparent())
            }
        })
    }
}
