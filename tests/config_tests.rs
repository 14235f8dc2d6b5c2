use std::path::PathBuf;

use approx::assert_relative_eq;
use detector_grid::GridError;
use detector_grid::api::{
    VISUALIZATION_CONFIG_JSON_SCHEMA_V1, VisualizationConfig, default_mappings_dir,
};
use detector_grid::core::Viewport;
use detector_grid::render::ColorScale;
use image::codecs::gif::Repeat;

#[test]
fn defaults_match_documented_values() {
    let config = VisualizationConfig::default();
    assert_eq!(config.factor_type, "normalized_gauss_ageing_factor");
    assert_eq!(config.color_scale, "custom");
    assert_relative_eq!(config.scale_min, 0.4);
    assert_relative_eq!(config.scale_max, 1.2);
    assert_eq!(config.viewport, Viewport::new(1200, 1000));
    assert_eq!(config.frame_duration_ms, 500);
    assert_eq!(config.loop_count, 0);
    assert!(config.mappings_dir.ends_with("mappings"));
    config.validate().expect("defaults are valid");
}

#[test]
fn default_mappings_dir_is_resolved_at_runtime() {
    // Tests run from the package root, where the bundled `mappings` directory lives.
    let dir = default_mappings_dir();
    assert_eq!(dir, PathBuf::from("mappings"));
    assert!(dir.is_relative());
    assert!(!dir.starts_with(env!("CARGO_MANIFEST_DIR")));
    assert_eq!(VisualizationConfig::default().mappings_dir, dir);
}

#[test]
fn partial_json_fills_in_defaults() {
    let config = VisualizationConfig::from_json_compat_str(
        r#"{ "color_scale": "viridis", "scale_max": 1.5, "loop_count": 2 }"#,
    )
    .expect("partial config");
    assert_eq!(config.color_scale, "viridis");
    assert_relative_eq!(config.scale_max, 1.5);
    assert_relative_eq!(config.scale_min, 0.4);
    assert!(matches!(config.animation_timing().repeat(), Repeat::Finite(2)));
    assert_eq!(config.resolved_color_scale().expect("scale"), ColorScale::Viridis);
}

#[test]
fn versioned_contract_round_trips() {
    let config = VisualizationConfig::default()
        .with_mappings_dir("/opt/mappings")
        .with_factor_type("ageing_factor")
        .with_scale_range(0.5, 1.1);
    let json = config.to_json_contract_v1_pretty().expect("serialize");
    assert!(json.contains(&format!("\"schema_version\": {VISUALIZATION_CONFIG_JSON_SCHEMA_V1}")));

    let parsed = VisualizationConfig::from_json_compat_str(&json).expect("parse contract");
    assert_eq!(parsed, config);
    assert_eq!(parsed.mappings_dir, PathBuf::from("/opt/mappings"));

    let bare = VisualizationConfig::from_json_compat_str(&config.to_json_pretty().expect("bare"))
        .expect("parse bare");
    assert_eq!(bare, config);
}

#[test]
fn unsupported_schema_version_is_rejected() {
    let err = VisualizationConfig::from_json_compat_str(r#"{ "schema_version": 9, "config": {} }"#)
        .expect_err("unknown version");
    assert!(matches!(err, GridError::InvalidData(message) if message.contains("schema version")));
}

#[test]
fn invalid_settings_fail_validation() {
    let inverted = VisualizationConfig::default().with_scale_range(1.2, 0.4);
    assert!(matches!(inverted.validate(), Err(GridError::InvalidData(_))));

    let bad_scale = VisualizationConfig::default().with_color_scale("rainbow");
    assert!(bad_scale.validate().is_err());

    let bad_palette = VisualizationConfig::default().with_custom_colors(vec!["#12".to_owned()]);
    assert!(bad_palette.validate().is_err());

    let no_viewport = VisualizationConfig::default().with_viewport(Viewport::new(0, 10));
    assert!(matches!(
        no_viewport.validate(),
        Err(GridError::InvalidViewport { .. })
    ));

    let no_duration = VisualizationConfig::default().with_frame_duration_ms(0);
    assert!(no_duration.validate().is_err());
}

#[test]
fn custom_palette_becomes_listed_scale() {
    let config = VisualizationConfig::default()
        .with_custom_colors(vec!["#000000".to_owned(), "#FFFFFF".to_owned()]);
    let scale = config.resolved_color_scale().expect("palette");
    assert!(matches!(scale, ColorScale::Listed(colors) if colors.len() == 2));
    assert!(config.has_known_factor_type());
}

#[test]
fn load_reports_missing_file_as_io() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = VisualizationConfig::load(&dir.path().join("absent.json")).expect_err("missing");
    assert!(matches!(err, GridError::Io { .. }));

    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "factor_type": "gaussian_ageing_factor" }"#).expect("write");
    let config = VisualizationConfig::load(&path).expect("load");
    assert_eq!(config.factor_type, "gaussian_ageing_factor");
}
