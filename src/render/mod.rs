mod color_scale;
mod draw;
mod frame;
mod null_renderer;
mod primitives;
mod raster;
mod svg;

pub use color_scale::{ColorScale, ColorScaleRange, DEFAULT_CUSTOM_PALETTE};
pub use draw::DrawStats;
pub use frame::RenderFrame;
pub use null_renderer::NullRenderer;
pub use primitives::{Color, LinePrimitive, RectPrimitive, TextHAlign, TextPrimitive};
pub use raster::RasterRenderer;
pub use svg::SvgRenderer;

use image::RgbaImage;

use crate::error::GridResult;

/// Contract implemented by any rendering backend.
///
/// Backends receive a fully materialized, deterministic `RenderFrame` so
/// drawing code stays isolated from detector and dataset logic.
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame) -> GridResult<()>;
}

#[cfg(feature = "cairo-backend")]
mod cairo_backend;
#[cfg(feature = "cairo-backend")]
pub use cairo_backend::{CairoContextRenderer, CairoRenderStats, CairoRenderer};

/// Rasterizes a frame with the best available bitmap backend.
///
/// Uses Cairo/Pango when the `cairo-backend` feature is enabled, the
/// `plotters` bitmap backend otherwise. Both draw labels and titles.
pub fn rasterize(frame: &RenderFrame) -> GridResult<RgbaImage> {
    #[cfg(feature = "cairo-backend")]
    {
        let mut renderer = CairoRenderer::new(frame.viewport)?;
        renderer.render(frame)?;
        return renderer.to_rgba_image();
    }

    #[cfg(not(feature = "cairo-backend"))]
    {
        let mut renderer = RasterRenderer::new(frame.viewport)?;
        renderer.render(frame)?;
        Ok(renderer.into_image())
    }
}

/// Serializes a frame into an SVG document.
pub fn to_svg(frame: &RenderFrame) -> GridResult<String> {
    let mut renderer = SvgRenderer::new();
    renderer.render(frame)?;
    Ok(renderer.into_document())
}
