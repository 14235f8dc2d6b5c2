use image::{DynamicImage, RgbImage, RgbaImage};
use plotters::prelude::{BitMapBackend, IntoDrawingArea};

use crate::core::Viewport;
use crate::error::{GridError, GridResult};
use crate::render::draw::{DrawStats, draw_frame};
use crate::render::{RenderFrame, Renderer};

const RGB_CHANNELS: usize = 3;

/// Bitmap backend drawing through `plotters`' `BitMapBackend`.
///
/// Labels and titles are rasterized with the system sans-serif font.
#[derive(Debug, Clone)]
pub struct RasterRenderer {
    image: RgbaImage,
    last_stats: DrawStats,
}

impl RasterRenderer {
    pub fn new(viewport: Viewport) -> GridResult<Self> {
        if !viewport.is_valid() {
            return Err(GridError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        Ok(Self {
            image: RgbaImage::new(viewport.width, viewport.height),
            last_stats: DrawStats::default(),
        })
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "plotters-bitmap"
    }

    #[must_use]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    #[must_use]
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, frame: &RenderFrame) -> GridResult<()> {
        frame.validate()?;
        let (width, height) = (frame.viewport.width, frame.viewport.height);
        let mut buffer = vec![0_u8; width as usize * height as usize * RGB_CHANNELS];

        let stats = {
            let area = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            let stats = draw_frame(&area, frame)?;
            area.present().map_err(|err| GridError::Draw(err.to_string()))?;
            stats
        };

        let rgb = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
            GridError::InvalidData(format!("bitmap buffer does not match {width}x{height}"))
        })?;
        self.image = DynamicImage::ImageRgb8(rgb).to_rgba8();
        self.last_stats = stats;
        Ok(())
    }
}
