use approx::assert_relative_eq;
use detector_grid::GridError;
use detector_grid::api::{
    GridRenderOptions, NO_DATA_MESSAGE, OutputFormat, grid_title, label_color_for, render_grid,
};
use detector_grid::core::{ChannelKey, ChannelMapping, GridPosition, RenderedFactors, Viewport};
use detector_grid::render::{Color, ColorScale, ColorScaleRange, NullRenderer, Renderer};
use std::path::Path;

fn two_cell_mapping() -> ChannelMapping {
    ChannelMapping::from_cells(
        "fta",
        [
            (ChannelKey::from_label("A0:CH01"), GridPosition::new(0.0, 0.0)),
            (ChannelKey::from_label("A0:CH02"), GridPosition::new(0.0, 1.0)),
        ],
    )
}

fn options() -> GridRenderOptions {
    GridRenderOptions::new("normalized_gauss_ageing_factor").with_viewport(Viewport::new(800, 600))
}

#[test]
fn mapping_keys_without_factors_render_at_neutral_value() {
    let mut factors = RenderedFactors::new();
    factors.insert(ChannelKey::from_label("A0:CH01"), 0.8);

    let image = render_grid(&two_cell_mapping(), &factors, &options()).expect("render");

    assert_eq!(image.cells().len(), 2);
    let first = image.cell("A0:CH01").expect("first cell");
    assert_relative_eq!(first.value, 0.8);
    assert!(!first.defaulted);
    let second = image.cell("A0:CH02").expect("second cell");
    assert_relative_eq!(second.value, 1.0);
    assert!(second.defaulted);
}

#[test]
fn factors_outside_the_mapping_are_ignored() {
    let mut factors = RenderedFactors::new();
    factors.insert(ChannelKey::from_label("Z9:CH99"), 0.5);
    let image = render_grid(&two_cell_mapping(), &factors, &options()).expect("render");
    assert_eq!(image.cells().len(), 2);
    assert!(image.cell("Z9:CH99").is_none());
}

#[test]
fn values_are_normalized_and_clamped() {
    let mut factors = RenderedFactors::new();
    factors.insert(ChannelKey::from_label("A0:CH01"), 0.0);
    factors.insert(ChannelKey::from_label("A0:CH02"), 0.8);
    let image = render_grid(&two_cell_mapping(), &factors, &options()).expect("render");

    assert_relative_eq!(image.cell("A0:CH01").expect("cell").normalized, 0.0);
    assert_relative_eq!(
        image.cell("A0:CH02").expect("cell").normalized,
        0.5,
        epsilon = 1e-12
    );
}

#[test]
fn frame_contains_cells_labels_and_colorbar() {
    let image = render_grid(&two_cell_mapping(), &RenderedFactors::new(), &options())
        .expect("render");
    let frame = image.frame();

    let labels: Vec<&str> = frame.label_texts().collect();
    // Two defaulted cells plus the 1.00 colour bar tick.
    assert_eq!(frame.count_labels("1.00"), 3);
    assert!(labels.contains(&"Normalized Gaussian - FTA"));
    assert!(labels.contains(&"0.40"));
    assert!(labels.contains(&"1.20"));
    assert!(labels.contains(&"Normalized Gaussian"));

    let mut renderer = NullRenderer::default();
    renderer.render(frame).expect("frame is valid");
    // Two cells and 64 colour bar strips; 4 bar borders and 5 ticks.
    assert_eq!(renderer.last_rect_count, 66);
    assert_eq!(renderer.last_line_count, 9);
    assert_eq!(frame.primitive_count(), 66 + 9 + 9);
}

#[test]
fn cells_are_square_and_rows_grow_downward() {
    let mapping = ChannelMapping::from_cells(
        "ftc",
        [
            (ChannelKey::from_label("C0:CH01"), GridPosition::new(0.0, 0.0)),
            (ChannelKey::from_label("C0:CH02"), GridPosition::new(1.0, 0.0)),
        ],
    );
    let image = render_grid(&mapping, &RenderedFactors::new(), &options()).expect("render");
    let top = image.frame().rects[0];
    let bottom = image.frame().rects[1];

    assert_relative_eq!(top.width, top.height);
    assert_relative_eq!(bottom.y - top.y, top.height, epsilon = 1e-9);
    assert_relative_eq!(top.x, bottom.x);
}

#[test]
fn empty_mapping_renders_placeholder() {
    let image = render_grid(&ChannelMapping::new("fta"), &RenderedFactors::new(), &options())
        .expect("placeholder");
    assert!(image.is_placeholder());
    assert!(image.cells().is_empty());
    assert_eq!(image.frame().texts.len(), 1);
    assert_eq!(image.frame().texts[0].text, NO_DATA_MESSAGE);
    let bitmap = image.to_rgba_image().expect("placeholder rasterizes");
    assert_eq!(bitmap.dimensions(), (800, 600));

    let background = image.frame().background.to_rgba8();
    let message = &image.frame().texts[0];
    let inked = bitmap
        .enumerate_pixels()
        .filter(|(x, y, _)| {
            (f64::from(*x) - message.x).abs() < 150.0 && (f64::from(*y) - message.y).abs() < 20.0
        })
        .filter(|(_, _, pixel)| pixel.0 != background)
        .count();
    assert!(inked > 0, "placeholder message left no pixels");
}

#[test]
fn cell_labels_are_drawn_into_bitmaps() {
    let mut factors = RenderedFactors::new();
    factors.insert(ChannelKey::from_label("A0:CH01"), 0.8);
    let image = render_grid(&two_cell_mapping(), &factors, &options()).expect("render");
    let bitmap = image.to_rgba_image().expect("rasterize");

    let cell = image.cell("A0:CH01").expect("cell");
    let rect = image.frame().rects[0];
    let center_x = (rect.x + rect.width / 2.0).round() as u32;
    let center_y = (rect.y + rect.height / 2.0).round() as u32;
    let fill = cell.fill.to_rgba8();

    let label_pixels = (center_x - 10..center_x + 10)
        .flat_map(|x| (center_y - 3..center_y + 3).map(move |y| (x, y)))
        .filter(|&(x, y)| bitmap.get_pixel(x, y).0 != fill)
        .count();
    assert!(label_pixels > 0, "label \"0.80\" left no pixels in its cell");
}

#[test]
fn invalid_viewport_is_rejected() {
    let err = render_grid(
        &two_cell_mapping(),
        &RenderedFactors::new(),
        &options().with_viewport(Viewport::new(0, 600)),
    )
    .expect_err("zero width");
    assert!(matches!(err, GridError::InvalidViewport { width: 0, .. }));
}

#[test]
fn title_mentions_reference_date_only_when_different() {
    assert_eq!(
        grid_title("ageing_factor", "fta", Some("2024-03-01"), Some("2024-01-01")),
        ["Ageing Factor - FTA", "2024-03-01 vs 2024-01-01"]
    );
    assert_eq!(
        grid_title("ageing_factor", "ftc", Some("2024-01-01"), Some("2024-01-01")),
        ["Ageing Factor - FTC", "2024-01-01"]
    );
    assert_eq!(
        grid_title("testparameter", "fta", None, Some("2024-01-01")),
        ["Testparameter - FTA"]
    );
}

#[test]
fn label_color_contrasts_with_fill() {
    assert_eq!(label_color_for(Color::BLACK), Color::WHITE);
    assert_eq!(label_color_for(Color::WHITE), Color::BLACK);
    assert_eq!(label_color_for(Color::rgb8(0x01, 0x63, 0x00)), Color::WHITE);
    assert_eq!(label_color_for(Color::rgb8(0xFF, 0xEE, 0x6B)), Color::BLACK);
}

#[test]
fn output_format_follows_extension() {
    assert_eq!(
        OutputFormat::resolve(Path::new("out/grid.JPEG")),
        (OutputFormat::Jpeg, Path::new("out/grid.JPEG").to_path_buf())
    );
    assert_eq!(OutputFormat::resolve(Path::new("grid.svg")).0, OutputFormat::Svg);
    assert_eq!(
        OutputFormat::resolve(Path::new("grid.pdf")),
        (OutputFormat::Png, Path::new("grid.png").to_path_buf())
    );
    assert_eq!(
        OutputFormat::resolve(Path::new("grid")),
        (OutputFormat::Png, Path::new("grid.png").to_path_buf())
    );
}

#[test]
fn saves_every_supported_format() {
    let dir = tempfile::tempdir().expect("temp dir");
    let small = options().with_viewport(Viewport::new(320, 240));
    let image = render_grid(&two_cell_mapping(), &RenderedFactors::new(), &small).expect("render");

    for name in ["grid.png", "grid.jpg", "grid.gif", "grid.svg"] {
        let written = image.save(&dir.path().join(name)).expect("save");
        assert!(written.exists(), "{name} written");
    }

    let written = image.save(&dir.path().join("grid.bmp")).expect("fallback save");
    assert_eq!(written, dir.path().join("grid.png"));

    let svg = std::fs::read_to_string(dir.path().join("grid.svg")).expect("read svg");
    assert!(svg.contains("Normalized Gaussian - FTA"));
}

#[test]
fn listed_palette_colors_cells() {
    let palette = ColorScale::listed(&["#FF0000", "#00FF00"]).expect("palette");
    let range = ColorScaleRange::new(0.0, 1.0).expect("range");
    let mut factors = RenderedFactors::new();
    factors.insert(ChannelKey::from_label("A0:CH01"), 0.1);
    factors.insert(ChannelKey::from_label("A0:CH02"), 0.9);

    let image = render_grid(
        &two_cell_mapping(),
        &factors,
        &options().with_color_scale(palette).with_range(range),
    )
    .expect("render");

    assert_eq!(image.cell("A0:CH01").expect("cell").fill, Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(image.cell("A0:CH02").expect("cell").fill, Color::rgb(0.0, 1.0, 0.0));
}
