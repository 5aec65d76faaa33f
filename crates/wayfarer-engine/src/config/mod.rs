//! Engine configuration.
//!
//! Every section and key is optional; omitted values take their defaults and
//! degenerate values are accepted with a warning. Only malformed JSON (or an
//! unreadable file) is an error.

mod background;
mod post;
mod scheduler;
mod simulation;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use background::{BackgroundConfig, DEFAULT_COLORS};
pub use post::{
    BloomConfig, ChromaticAberrationConfig, DistortionConfig, NoiseConfig, NormalEdgesConfig,
    PostConfig, VignetteConfig,
};
pub use scheduler::{FrameLoop, SchedulerConfig};
pub use simulation::{FluidConfig, FlowmapConfig};

/// Which simulation produces the distortion field.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    /// No simulation; consumers sample a neutral zero field.
    None,
    #[default]
    Flowmap,
    Fluid,
    /// Both run; the fluid dye is exposed.
    Both,
}

impl FieldSource {
    pub fn runs_flowmap(self) -> bool {
        matches!(self, FieldSource::Flowmap | FieldSource::Both)
    }

    pub fn runs_fluid(self) -> bool {
        matches!(self, FieldSource::Fluid | FieldSource::Both)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub field: FieldSource,
    pub background: BackgroundConfig,
    pub fluid: FluidConfig,
    pub flowmap: FlowmapConfig,
    pub post: PostConfig,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("invalid engine config JSON")?;
        config.warn_degenerate();
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Logs every accepted-but-degenerate setting.
    pub fn warn_degenerate(&self) {
        for msg in self.fluid.degeneracies() {
            log::warn!("fluid config: {msg}");
        }
        for msg in self.flowmap.degeneracies() {
            log::warn!("flowmap config: {msg}");
        }
        if self.background.max_delta_ms <= 0.0 {
            log::warn!("background config: maxDeltaMs <= 0 freezes the animation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let cfg = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.fluid.pressure_iterations, 3);
        assert_eq!(cfg.fluid.max_step_ms, 33.0);
        assert_eq!(cfg.background.max_delta_ms, 66.0);
        assert_eq!(cfg.scheduler.frameloop, FrameLoop::Demand);
        assert!(!cfg.post.any_enabled());
    }

    #[test]
    fn camel_case_keys_override_single_fields() {
        let cfg = EngineConfig::from_json_str(
            r##"{
                "field": "fluid",
                "fluid": { "simResolution": 64, "curlStrength": 0 },
                "background": { "darkenTop": true, "colors": ["#000", "#fff", "#f00", "#0f0"] },
                "post": { "bloom": { "threshold": 0.5 }, "vignette": null },
                "scheduler": { "frameloop": "always" }
            }"##,
        )
        .unwrap();

        assert_eq!(cfg.field, FieldSource::Fluid);
        assert_eq!(cfg.fluid.sim_resolution, 64);
        assert_eq!(cfg.fluid.curl_strength, 0.0);
        assert_eq!(cfg.fluid.dye_resolution, 512);
        assert!(cfg.background.darken_top);
        assert_eq!(cfg.post.bloom, Some(BloomConfig { intensity: 1.0, threshold: 0.5 }));
        assert_eq!(cfg.post.vignette, None);
        assert_eq!(cfg.scheduler.frameloop, FrameLoop::Always);
    }

    #[test]
    fn degenerate_values_are_accepted() {
        let cfg = EngineConfig::from_json_str(
            r#"{ "fluid": { "splatRadius": -1, "pressureIterations": 0 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.fluid.degeneracies().len(), 2);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EngineConfig::from_json_str("{ fluid: ").is_err());
        assert!(EngineConfig::from_json_str(r#"{ "fluid": { "simResolution": "big" } }"#).is_err());
    }

    #[test]
    fn bad_hex_color_falls_back() {
        let mut cfg = BackgroundConfig::default();
        cfg.colors[2] = "not a color".to_owned();
        let colors = cfg.resolved_colors();
        let fallback = crate::paint::Color::from_hex(DEFAULT_COLORS[2]).unwrap();
        assert_eq!(colors[2], fallback);
    }
}
