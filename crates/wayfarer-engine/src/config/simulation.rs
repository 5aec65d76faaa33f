use serde::{Deserialize, Serialize};

/// Fluid solver parameters. Immutable per simulation instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FluidConfig {
    /// Short side of the velocity/pressure grid.
    pub sim_resolution: u32,
    /// Short side of the dye grid.
    pub dye_resolution: u32,
    pub density_dissipation: f32,
    pub velocity_dissipation: f32,
    /// Fraction of last step's pressure carried into the solve.
    pub pressure_dissipation: f32,
    pub curl_strength: f32,
    /// Gaussian radius in normalized height units.
    pub splat_radius: f32,
    pub pressure_iterations: u32,
    /// Upper bound on one step's time delta.
    pub max_step_ms: f32,
    /// Dye injected per unit of splat velocity.
    pub dye_color_scale: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            sim_resolution: 128,
            dye_resolution: 512,
            density_dissipation: 1.0,
            velocity_dissipation: 0.2,
            pressure_dissipation: 0.8,
            curl_strength: 30.0,
            splat_radius: 0.05,
            pressure_iterations: 3,
            max_step_ms: 33.0,
            dye_color_scale: 3.0,
        }
    }
}

impl FluidConfig {
    /// Degenerate but accepted settings, one message each.
    pub fn degeneracies(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.splat_radius <= 0.0 {
            out.push(format!("splatRadius {} <= 0: splats are ignored", self.splat_radius));
        }
        if self.pressure_iterations == 0 {
            out.push("pressureIterations = 0: projection uses stale pressure".to_owned());
        }
        if self.sim_resolution.saturating_mul(2) > self.dye_resolution {
            out.push(format!(
                "simResolution {} exceeds half of dyeResolution {}; clamped",
                self.sim_resolution, self.dye_resolution
            ));
        }
        if self.max_step_ms <= 0.0 {
            out.push("maxStepMs <= 0: the simulation never advances".to_owned());
        }
        out
    }
}

/// Lightweight pointer flowmap parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FlowmapConfig {
    /// Stamp radius in normalized height units.
    pub falloff: f32,
    /// Stamp strength.
    pub alpha: f32,
    /// Per-update retention factor.
    pub dissipation: f32,
    pub resolution: u32,
    /// Exponential smoothing applied to the pointer velocity (0 = none).
    pub velocity_smoothing: f32,
}

impl Default for FlowmapConfig {
    fn default() -> Self {
        Self {
            falloff: 0.15,
            alpha: 1.0,
            dissipation: 0.98,
            resolution: 128,
            velocity_smoothing: 0.5,
        }
    }
}

impl FlowmapConfig {
    pub fn degeneracies(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.dissipation >= 1.0 {
            out.push(format!("dissipation {} >= 1: the field never decays", self.dissipation));
        }
        if self.falloff <= 0.0 {
            out.push(format!("falloff {} <= 0: pointer stamps are ignored", self.falloff));
        }
        out
    }
}
