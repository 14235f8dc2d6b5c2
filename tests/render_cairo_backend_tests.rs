#![cfg(feature = "cairo-backend")]

use cairo::{Context, Format, ImageSurface};
use detector_grid::GridError;
use detector_grid::api::{GridRenderOptions, render_grid};
use detector_grid::core::{ChannelKey, ChannelMapping, GridPosition, RenderedFactors, Viewport};
use detector_grid::render::{CairoContextRenderer, CairoRenderer, Renderer, rasterize};

fn grid_mapping() -> ChannelMapping {
    ChannelMapping::from_cells(
        "fta",
        [
            (ChannelKey::from_label("A0:CH01"), GridPosition::new(0.0, 0.0)),
            (ChannelKey::from_label("A0:CH02"), GridPosition::new(0.0, 1.0)),
        ],
    )
}

#[test]
fn cairo_renderer_rejects_invalid_surface_size() {
    let err = CairoRenderer::new(Viewport::new(0, 480)).expect_err("invalid width must fail");
    assert!(matches!(err, GridError::InvalidViewport { .. }));
}

#[test]
fn cairo_renderer_draws_cells_and_labels() {
    let options = GridRenderOptions::new("ageing_factor").with_viewport(Viewport::new(600, 400));
    let image = render_grid(&grid_mapping(), &RenderedFactors::new(), &options).expect("grid");

    let mut renderer = CairoRenderer::new(Viewport::new(600, 400)).expect("renderer");
    renderer.render(image.frame()).expect("render");
    let stats = renderer.last_stats();

    assert_eq!(stats.rects_drawn, image.frame().rects.len());
    assert_eq!(stats.texts_drawn, image.frame().texts.len());
    assert!(stats.lines_drawn >= 4);
}

#[test]
fn cairo_output_converts_to_rgba() {
    let options = GridRenderOptions::new("ageing_factor").with_viewport(Viewport::new(300, 200));
    let image = render_grid(&grid_mapping(), &RenderedFactors::new(), &options).expect("grid");

    let bitmap = rasterize(image.frame()).expect("rasterize");
    assert_eq!(bitmap.dimensions(), (300, 200));
    assert_eq!(bitmap.get_pixel(0, 199).0, [255, 255, 255, 255]);
}

#[test]
fn cairo_renderer_can_draw_on_external_context() {
    let options = GridRenderOptions::new("ageing_factor").with_viewport(Viewport::new(320, 240));
    let image = render_grid(&grid_mapping(), &RenderedFactors::new(), &options).expect("grid");

    let surface = ImageSurface::create(Format::ARgb32, 320, 240).expect("surface");
    let context = Context::new(&surface).expect("context");
    let mut renderer = CairoRenderer::new(Viewport::new(320, 240)).expect("renderer");
    renderer
        .render_on_cairo_context(&context, image.frame())
        .expect("render on external context");
    assert!(renderer.last_stats().rects_drawn > 0);
}
