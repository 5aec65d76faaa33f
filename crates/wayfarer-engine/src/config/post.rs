use serde::{Deserialize, Serialize};

/// Optional effects. An absent (or `null`) effect is disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostConfig {
    pub bloom: Option<BloomConfig>,
    pub noise: Option<NoiseConfig>,
    pub vignette: Option<VignetteConfig>,
    pub chromatic_aberration: Option<ChromaticAberrationConfig>,
    /// Warps the composited frame by the distortion field.
    pub distortion: Option<DistortionConfig>,
    /// Darkens normal discontinuities; needs the normal pre-pass.
    pub normal_edges: Option<NormalEdgesConfig>,
}

impl PostConfig {
    pub fn any_enabled(&self) -> bool {
        self.bloom.is_some()
            || self.noise.is_some()
            || self.vignette.is_some()
            || self.chromatic_aberration.is_some()
            || self.distortion.is_some()
            || self.normal_edges.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub intensity: f32,
    pub threshold: f32,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub amount: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self { amount: 0.05 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteConfig {
    pub offset: f32,
    pub darkness: f32,
}

impl Default for VignetteConfig {
    fn default() -> Self {
        Self {
            offset: 1.0,
            darkness: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaticAberrationConfig {
    /// Red/blue separation in normalized width units.
    pub offset: f32,
}

impl Default for ChromaticAberrationConfig {
    fn default() -> Self {
        Self { offset: 0.002 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistortionConfig {
    pub strength: f32,
}

impl Default for DistortionConfig {
    fn default() -> Self {
        Self { strength: 0.02 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalEdgesConfig {
    pub strength: f32,
}

impl Default for NormalEdgesConfig {
    fn default() -> Self {
        Self { strength: 1.0 }
    }
}
