use std::io::Write;

use wayfarer_engine::config::{EngineConfig, FieldSource, FrameLoop};

#[test]
fn loads_partial_config_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "field": "both",
            "fluid": {{ "pressureIterations": 20, "splatRadius": 0.25 }},
            "flowmap": {{ "falloff": 0.3 }},
            "scheduler": {{ "frameloop": "never", "resizeDebounceMs": 40 }}
        }}"#
    )
    .unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.field, FieldSource::Both);
    assert_eq!(config.fluid.pressure_iterations, 20);
    assert_eq!(config.fluid.splat_radius, 0.25);
    assert_eq!(config.fluid.sim_resolution, 128);
    assert_eq!(config.flowmap.falloff, 0.3);
    assert_eq!(config.scheduler.frameloop, FrameLoop::Never);
    assert_eq!(config.scheduler.resize_debounce_ms, 40);
    assert_eq!(config.scheduler.layout_debounce_ms, 100);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn malformed_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"{ \"fluid\": [1, 2").unwrap();
    assert!(EngineConfig::load(file.path()).is_err());
}

#[test]
fn missing_grain_texture_degrades_to_solid_background() {
    use wayfarer_engine::background::{BackgroundMesh, BackgroundMode};
    use wayfarer_engine::coords::Extent;
    use wayfarer_engine::device::SoftService;

    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::default();
    config.background.grain_texture = Some(dir.path().join("grain.png"));

    let mut gpu = SoftService::new(Extent::new(8, 8));
    let mesh = BackgroundMesh::new(&mut gpu, config.background);
    assert_eq!(mesh.mode(), BackgroundMode::Solid);
    assert!(!mesh.is_animated());
}
