use std::fs;

use detector_grid::GridError;
use detector_grid::api::{
    AnimationTiming, GridVisualizationService, VisualizationConfig, load_document_from_path,
    load_document_from_str, write_example_document,
};
use detector_grid::core::{
    EXAMPLE_FACTOR_MAX, EXAMPLE_FACTOR_MIN, ExampleDataConfig, FactorType, Viewport,
    generate_example_data,
};

const BUNDLED_MAPPINGS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/mappings");

fn service() -> GridVisualizationService {
    GridVisualizationService::with_config(
        VisualizationConfig::default()
            .with_mappings_dir(BUNDLED_MAPPINGS)
            .with_viewport(Viewport::new(400, 300)),
    )
}

fn example_config(detector: &str) -> ExampleDataConfig {
    ExampleDataConfig::for_detector(detector)
        .with_shape(3, 2, 12)
        .with_seed(42)
}

#[test]
fn generated_data_always_validates() {
    for seed in 0..20 {
        for detector in ["fta", "ftc"] {
            let document = generate_example_data(&example_config(detector).with_seed(seed))
                .expect("generate");
            let json = document.to_json_pretty().expect("serialize");
            let reloaded = load_document_from_str(&json).expect("generator output validates");
            assert_eq!(reloaded.datasets().len(), document.datasets().len());
        }
    }
}

#[test]
fn latest_extraction_yields_one_key_per_channel_within_bounds() {
    let document = generate_example_data(&example_config("fta")).expect("generate");
    let factors = service().extract_factors(
        &document,
        None,
        FactorType::NormalizedGaussAgeingFactor.as_str(),
    );

    assert_eq!(factors.len(), 24);
    for (key, value) in &factors {
        assert!(key.module() == "A0" || key.module() == "A1", "unexpected key {key}");
        assert!(
            (EXAMPLE_FACTOR_MIN..=EXAMPLE_FACTOR_MAX).contains(value),
            "{key} = {value} out of bounds"
        );
    }
}

#[test]
fn generator_uses_detector_prefix_and_thirty_day_steps() {
    let document = generate_example_data(&example_config("ftc")).expect("generate");
    let service = service();
    assert_eq!(
        service.available_dates(&document),
        ["2024-01-01", "2024-01-31", "2024-03-01"]
    );
    assert_eq!(document.datasets()[0].modules[1].identifier, "C1");
    let parameters = service.available_parameters(&document);
    for factor_type in FactorType::ALL {
        assert!(parameters.contains(factor_type.as_str()));
    }
}

#[test]
fn renders_every_mapping_cell_for_known_detector() {
    let service = service();
    let document = generate_example_data(&example_config("fta")).expect("generate");
    let options = service.default_options().expect("options");

    let image = service
        .render_grid("fta", &document, &options)
        .expect("render")
        .expect("fta mapping is bundled");

    assert_eq!(image.cells().len(), 36);
    assert_eq!(image.cells().iter().filter(|cell| !cell.defaulted).count(), 24);
    assert_eq!(image.title_lines(), ["Normalized Gaussian - FTA"]);
}

#[test]
fn selected_date_title_compares_with_first_dataset() {
    let service = service();
    let document = generate_example_data(&example_config("ftc")).expect("generate");
    let options = service
        .default_options()
        .expect("options")
        .with_selected_date(Some("2024-03-01".to_owned()));

    let image = service
        .render_grid("ftc", &document, &options)
        .expect("render")
        .expect("ftc mapping is bundled");
    assert_eq!(
        image.title_lines(),
        ["Normalized Gaussian - FTC", "2024-03-01 vs 2024-01-01"]
    );
}

#[test]
fn unknown_detector_is_a_lookup_miss() {
    let service = service();
    let document = generate_example_data(&example_config("fta")).expect("generate");
    let options = service.default_options().expect("options");

    assert!(service.render_grid("ftx", &document, &options).expect("no error").is_none());
    assert!(
        service
            .render_animation("ftx", &document, &options, AnimationTiming::default())
            .expect("no error")
            .is_none()
    );
}

#[test]
fn animation_has_one_frame_per_date() {
    let service = service();
    let document = generate_example_data(&example_config("fta")).expect("generate");
    let options = service.default_options().expect("options");

    let animation = service
        .render_animation("fta", &document, &options, service.config().animation_timing())
        .expect("render")
        .expect("fta mapping is bundled");

    assert_eq!(animation.dates(), ["2024-01-01", "2024-01-31", "2024-03-01"]);
    assert!(animation.skipped_dates().is_empty());
    let last = &animation.frames()[2].grid;
    assert_eq!(last.title_lines()[1], "2024-03-01 vs 2024-01-01");
}

#[test]
fn animation_fails_when_every_frame_fails() {
    let service = GridVisualizationService::with_config(
        VisualizationConfig::default()
            .with_mappings_dir(BUNDLED_MAPPINGS)
            .with_viewport(Viewport::new(0, 0)),
    );
    let document = generate_example_data(&example_config("fta")).expect("generate");
    let options = service.default_options().expect("options");

    let err = service
        .render_animation("fta", &document, &options, AnimationTiming::default())
        .expect_err("zero viewport breaks every frame");
    assert!(matches!(err, GridError::NoFrames));
}

#[test]
fn documents_round_trip_through_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("example.json");
    let written = write_example_document(&path, &example_config("fta")).expect("write example");
    let loaded = load_document_from_path(&path).expect("load example");
    assert_eq!(
        service().available_dates(&loaded),
        service().available_dates(&written)
    );
    assert_eq!(loaded.datasets()[0].channel_count(), 24);

    let err = load_document_from_path(&dir.path().join("missing.json")).expect_err("missing");
    assert!(matches!(err, GridError::Io { .. }));

    fs::write(&path, "{\"datasets\": []}").expect("overwrite");
    let err = load_document_from_path(&path).expect_err("empty datasets");
    assert!(matches!(err, GridError::Validation(_)));
}

#[test]
fn refresh_picks_up_new_mapping_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut service = GridVisualizationService::new(dir.path());
    assert!(service.available_mappings().is_empty());

    fs::write(dir.path().join("fta.csv"), "PM:Channel,row,col\nA0:CH01,0,0\n").expect("write");
    service.refresh_mappings();

    let mappings = service.available_mappings();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].name, "fta");
    assert_eq!(service.mapping("fta").map(|mapping| mapping.len()), Some(1));
}
