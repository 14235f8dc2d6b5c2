use plotters::prelude::{IntoDrawingArea, SVGBackend};

use crate::error::{GridError, GridResult};
use crate::render::draw::{DrawStats, draw_frame};
use crate::render::{RenderFrame, Renderer};

/// Vector backend that serializes a frame into a standalone SVG document.
#[derive(Debug, Default)]
pub struct SvgRenderer {
    document: String,
    last_stats: DrawStats,
}

impl SvgRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "plotters-svg"
    }

    /// Last rendered document; empty before the first render.
    #[must_use]
    pub fn document(&self) -> &str {
        &self.document
    }

    #[must_use]
    pub fn into_document(self) -> String {
        self.document
    }

    #[must_use]
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, frame: &RenderFrame) -> GridResult<()> {
        frame.validate()?;
        let mut document = String::new();
        let size = (frame.viewport.width, frame.viewport.height);

        let stats = {
            let area = SVGBackend::with_string(&mut document, size).into_drawing_area();
            let stats = draw_frame(&area, frame)?;
            area.present().map_err(|err| GridError::Draw(err.to_string()))?;
            stats
        };

        self.document = document;
        self.last_stats = stats;
        Ok(())
    }
}
