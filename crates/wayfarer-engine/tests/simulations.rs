use wayfarer_engine::config::{FlowmapConfig, FluidConfig};
use wayfarer_engine::coords::{Extent, Vec2};
use wayfarer_engine::device::{FrameEncoder, GpuService, SoftService};
use wayfarer_engine::input::SplatEvent;
use wayfarer_engine::render::RenderTarget;
use wayfarer_engine::sim::{Flowmap, FluidSimulation};

fn texel_uv(target: RenderTarget, x: u32, y: u32) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / target.extent.width as f32,
        (y as f32 + 0.5) / target.extent.height as f32,
    )
}

fn run(gpu: &mut SoftService, record: impl FnOnce(&mut FrameEncoder)) {
    let mut frame = FrameEncoder::new();
    record(&mut frame);
    gpu.submit(frame).unwrap();
}

#[test]
fn uniform_velocity_decays_geometrically() {
    let canvas = Extent::new(32, 32);
    let mut gpu = SoftService::new(canvas);
    let config = FluidConfig {
        sim_resolution: 8,
        dye_resolution: 16,
        velocity_dissipation: 0.2,
        max_step_ms: 1000.0,
        ..FluidConfig::default()
    };
    let mut fluid = FluidSimulation::new(&mut gpu, config, canvas).unwrap();

    run(&mut gpu, |frame| {
        fluid.fill_velocity(frame, 10.0, 5.0);
        fluid.step(frame, 1.0, &[]);
    });
    for _ in 0..4 {
        run(&mut gpu, |frame| fluid.step(frame, 1.0, &[]));
    }

    let expected = (1.0f32 / 1.2).powi(5);
    let v = gpu.read_target(fluid.velocity().id, 4, 4).unwrap();
    assert!((v[0] - 10.0 * expected).abs() < 1e-3, "{v:?}");
    assert!((v[1] - 5.0 * expected).abs() < 1e-3, "{v:?}");
}

#[test]
fn frame_dt_is_clamped_before_stepping() {
    let canvas = Extent::new(32, 32);
    let mut gpu = SoftService::new(canvas);
    let config = FluidConfig {
        sim_resolution: 8,
        dye_resolution: 16,
        velocity_dissipation: 1.0,
        max_step_ms: 100.0,
        ..FluidConfig::default()
    };
    let mut fluid = FluidSimulation::new(&mut gpu, config, canvas).unwrap();

    // A ten-second stall advances the same as one capped step.
    run(&mut gpu, |frame| {
        fluid.fill_velocity(frame, 1.0, 0.0);
        fluid.step(frame, 10.0, &[]);
    });
    let v = gpu.read_target(fluid.velocity().id, 4, 4).unwrap();
    assert!((v[0] - 1.0 / 1.1).abs() < 1e-4, "{v:?}");
}

#[test]
fn splat_stays_local() {
    let canvas = Extent::new(64, 64);
    let mut gpu = SoftService::new(canvas);
    let config = FluidConfig {
        sim_resolution: 32,
        dye_resolution: 64,
        splat_radius: 0.05,
        dye_color_scale: 3.0,
        ..FluidConfig::default()
    };
    let radius = config.splat_radius;
    let mut fluid = FluidSimulation::new(&mut gpu, config, canvas).unwrap();

    let center = Vec2::new(0.5, 0.5);
    let splat = SplatEvent::new(center, Vec2::new(1.0, 0.0));
    run(&mut gpu, |frame| fluid.step(frame, 0.0, &[splat]));

    let dye = fluid.output();
    let mut peak = 0.0f32;
    for y in 0..dye.extent.height {
        for x in 0..dye.extent.width {
            let uv = texel_uv(dye, x, y);
            let value = gpu.read_target(dye.id, x, y).unwrap()[0];
            peak = peak.max(value);
            if (uv - center).length() > 4.0 * radius {
                assert!(value.abs() < 1e-5, "dye {value} leaked to {uv:?}");
            }
        }
    }
    assert!(peak > 2.5, "peak {peak}");
}

#[test]
fn splat_is_circular_on_a_wide_canvas() {
    let canvas = Extent::new(96, 48);
    let mut gpu = SoftService::new(canvas);
    let config = FluidConfig {
        sim_resolution: 16,
        dye_resolution: 48,
        splat_radius: 0.05,
        dye_color_scale: 3.0,
        ..FluidConfig::default()
    };
    let radius = config.splat_radius;
    let aspect = canvas.width as f32 / canvas.height as f32;
    let mut fluid = FluidSimulation::new(&mut gpu, config, canvas).unwrap();

    let center = Vec2::new(0.5, 0.5);
    let splat = SplatEvent::new(center, Vec2::new(1.0, 0.0));
    run(&mut gpu, |frame| fluid.step(frame, 0.0, &[splat]));

    let dye = fluid.output();
    assert_eq!(dye.extent, Extent::new(96, 48));

    // Distance in aspect-corrected units: x is stretched by width / height.
    let corrected = |uv: Vec2| {
        let d = uv - center;
        Vec2::new(d.x * aspect, d.y).length()
    };
    for y in 0..dye.extent.height {
        for x in 0..dye.extent.width {
            let uv = texel_uv(dye, x, y);
            if corrected(uv) > 3.0 * radius {
                let value = gpu.read_target(dye.id, x, y).unwrap()[0];
                assert!(value < 5e-4, "dye {value} at {uv:?}");
            }
        }
    }

    // Equal corrected distance, equal density, whichever axis.
    for d in [0.02f32, 0.05, 0.08] {
        let along_x = gpu.sample_target(dye.id, center + Vec2::new(d / aspect, 0.0)).unwrap()[0];
        let along_y = gpu.sample_target(dye.id, center + Vec2::new(0.0, d)).unwrap()[0];
        assert!(along_x > 0.0);
        assert!((along_x - along_y).abs() < 1e-4, "d={d}: x {along_x} vs y {along_y}");
    }
}

#[test]
fn repeated_corner_splats_stay_finite() {
    let canvas = Extent::new(48, 32);
    let mut gpu = SoftService::new(canvas);
    let config = FluidConfig {
        sim_resolution: 16,
        dye_resolution: 32,
        ..FluidConfig::default()
    };
    let mut fluid = FluidSimulation::new(&mut gpu, config, canvas).unwrap();

    for _ in 0..10 {
        let splat = SplatEvent::new(Vec2::new(0.2, 0.2), Vec2::new(400.0, -250.0));
        run(&mut gpu, |frame| fluid.step(frame, 0.016, &[splat]));
    }

    let dye = gpu.target_pixels(fluid.output().id).unwrap();
    assert!(dye.iter().any(|p| p[0] > 0.0 || p[1] > 0.0));
    assert!(dye.iter().flatten().all(|c| c.is_finite()));

    let velocity = gpu.target_pixels(fluid.velocity().id).unwrap();
    assert!(velocity.iter().flatten().all(|c| c.is_finite()));
}

#[test]
fn corner_splat_with_default_config_falls_off_smoothly() {
    let canvas = Extent::new(64, 64);
    let mut gpu = SoftService::new(canvas);
    let mut fluid = FluidSimulation::new(&mut gpu, FluidConfig::default(), canvas).unwrap();

    let center = Vec2::new(0.2, 0.2);
    let splat = SplatEvent::new(center, Vec2::new(1.0, 0.0));
    run(&mut gpu, |frame| fluid.step(frame, 0.016, &[splat]));
    for _ in 0..9 {
        run(&mut gpu, |frame| fluid.step(frame, 0.016, &[]));
    }

    let dye = fluid.output();
    let at = |uv: Vec2| gpu.sample_target(dye.id, uv).unwrap()[0];
    assert!(at(center) > 0.0);

    // Across the flow direction the profile only decays.
    let profile: Vec<f32> = (0..8)
        .map(|k| at(center + Vec2::new(0.0, 0.02 * k as f32)))
        .collect();
    for pair in profile.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-5, "{profile:?}");
    }
    assert!(profile[7] < profile[0] * 0.1, "{profile:?}");

    let pixels = gpu.target_pixels(dye.id).unwrap();
    assert!(pixels.iter().flatten().all(|c| c.is_finite()));
}

#[test]
fn reset_zeroes_every_field() {
    let canvas = Extent::new(32, 32);
    let mut gpu = SoftService::new(canvas);
    let config = FluidConfig {
        sim_resolution: 8,
        dye_resolution: 16,
        ..FluidConfig::default()
    };
    let mut fluid = FluidSimulation::new(&mut gpu, config, canvas).unwrap();
    let splat = SplatEvent::new(Vec2::new(0.5, 0.5), Vec2::new(50.0, 50.0));
    run(&mut gpu, |frame| fluid.step(frame, 0.016, &[splat]));

    run(&mut gpu, |frame| fluid.reset(frame));
    for target in [fluid.output(), fluid.velocity(), fluid.pressure()] {
        let pixels = gpu.target_pixels(target.id).unwrap();
        assert!(pixels.iter().all(|p| p[0] == 0.0 && p[1] == 0.0));
    }
}

#[test]
fn flowmap_fades_once_the_pointer_is_gone() {
    let canvas = Extent::new(64, 64);
    let mut gpu = SoftService::new(canvas);
    let config = FlowmapConfig {
        resolution: 32,
        dissipation: 0.9,
        ..FlowmapConfig::default()
    };
    let mut flowmap = Flowmap::new(&mut gpu, config, canvas).unwrap();

    for i in 0..5 {
        let pointer = Vec2::new(0.3 + 0.05 * i as f32, 0.5);
        run(&mut gpu, |frame| flowmap.update(frame, 0.016, Some(pointer)));
    }
    let peak = |gpu: &SoftService, flowmap: &Flowmap| {
        gpu.target_pixels(flowmap.texture().id)
            .unwrap()
            .iter()
            .map(|p| p[0].abs().max(p[1].abs()))
            .fold(0.0f32, f32::max)
    };
    let stirred = peak(&gpu, &flowmap);
    assert!(stirred > 0.0);

    for _ in 0..60 {
        run(&mut gpu, |frame| flowmap.update(frame, 0.016, None));
    }
    let settled = peak(&gpu, &flowmap);
    assert!(settled <= stirred * 0.9f32.powi(60) + 1e-6, "{settled} vs {stirred}");
    assert!(flowmap.velocity().length() < 1e-3);
}
