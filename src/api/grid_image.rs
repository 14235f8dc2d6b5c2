use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{
    ChannelKey, ChannelMapping, DEFAULT_FACTOR_VALUE, GridPosition, RenderedFactors, Viewport,
    factor_display_name,
};
use crate::error::{GridError, GridResult};
use crate::render::{
    Color, ColorScale, ColorScaleRange, LinePrimitive, RectPrimitive, RenderFrame, TextHAlign,
    TextPrimitive,
};

use super::VisualizationConfig;

pub const NO_DATA_MESSAGE: &str = "No data available";

const TITLE_FONT_PX: f64 = 20.0;
const TITLE_LINE_HEIGHT: f64 = 28.0;
const TITLE_TOP: f64 = 26.0;
const PLOT_TOP: f64 = 90.0;
const PLOT_MARGIN: f64 = 30.0;
const COLORBAR_WIDTH: f64 = 28.0;
const COLORBAR_AREA: f64 = 160.0;
const COLORBAR_STRIPS: usize = 64;
const COLORBAR_TICKS: usize = 5;
const AXIS_FONT_PX: f64 = 12.0;
const CELL_BORDER_WIDTH: f64 = 1.0;
const MIN_VALUE_FONT_PX: f64 = 6.0;
const MAX_VALUE_FONT_PX: f64 = 16.0;
const LABEL_LUMINANCE_THRESHOLD: f64 = 0.5;

/// Output encoding chosen from a target path extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Gif,
    Svg,
}

impl OutputFormat {
    /// Maps an extension (case-insensitive) to a format.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Format and effective path for `path`; unknown extensions become `.png`.
    #[must_use]
    pub fn resolve(path: &Path) -> (Self, PathBuf) {
        let format = path
            .extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension);
        match format {
            Some(format) => (format, path.to_path_buf()),
            None => {
                let fallback = path.with_extension("png");
                warn!(
                    requested = %path.display(),
                    effective = %fallback.display(),
                    "unrecognized image extension, writing png"
                );
                (Self::Png, fallback)
            }
        }
    }
}

/// Inputs that shape one grid image besides the mapping and the values.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRenderOptions {
    pub factor_type: String,
    pub selected_date: Option<String>,
    pub reference_date: Option<String>,
    pub color_scale: ColorScale,
    pub range: ColorScaleRange,
    pub viewport: Viewport,
}

impl GridRenderOptions {
    #[must_use]
    pub fn new(factor_type: impl Into<String>) -> Self {
        Self {
            factor_type: factor_type.into(),
            selected_date: None,
            reference_date: None,
            color_scale: ColorScale::default(),
            range: ColorScaleRange::default(),
            viewport: Viewport::default(),
        }
    }

    pub fn from_config(config: &VisualizationConfig) -> GridResult<Self> {
        Ok(Self {
            factor_type: config.factor_type.clone(),
            selected_date: None,
            reference_date: None,
            color_scale: config.resolved_color_scale()?,
            range: config.color_range()?,
            viewport: config.viewport,
        })
    }

    #[must_use]
    pub fn with_selected_date(mut self, selected: Option<String>) -> Self {
        self.selected_date = selected;
        self
    }

    #[must_use]
    pub fn with_dates(mut self, selected: Option<String>, reference: Option<String>) -> Self {
        self.selected_date = selected;
        self.reference_date = reference;
        self
    }

    #[must_use]
    pub fn with_color_scale(mut self, color_scale: ColorScale) -> Self {
        self.color_scale = color_scale;
        self
    }

    #[must_use]
    pub fn with_range(mut self, range: ColorScaleRange) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }
}

/// One rendered grid square.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    pub key: ChannelKey,
    pub position: GridPosition,
    pub value: f64,
    /// Value position on the color scale, in `0..=1`.
    pub normalized: f64,
    /// `true` when the mapping key had no extracted factor.
    pub defaulted: bool,
    #[serde(skip)]
    pub fill: Color,
}

/// Rendered grid: resolved cells plus the drawable scene.
#[derive(Debug, Clone, PartialEq)]
pub struct GridImage {
    title: Vec<String>,
    cells: Vec<GridCell>,
    frame: RenderFrame,
}

impl GridImage {
    #[must_use]
    pub fn title_lines(&self) -> &[String] {
        &self.title
    }

    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    #[must_use]
    pub fn cell(&self, key: &str) -> Option<&GridCell> {
        self.cells.iter().find(|cell| cell.key.as_str() == key)
    }

    #[must_use]
    pub fn frame(&self) -> &RenderFrame {
        &self.frame
    }

    /// `true` for the "No data available" frame produced from an empty mapping.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_svg(&self) -> GridResult<String> {
        crate::render::to_svg(&self.frame)
    }

    pub fn to_rgba_image(&self) -> GridResult<RgbaImage> {
        crate::render::rasterize(&self.frame)
    }

    /// Writes the image in the format implied by `path` and returns the
    /// path actually written.
    pub fn save(&self, path: &Path) -> GridResult<PathBuf> {
        let (format, path) = OutputFormat::resolve(path);
        match format {
            OutputFormat::Svg => {
                let document = self.to_svg()?;
                fs::write(&path, document).map_err(|source| GridError::io(&path, source))?;
            }
            OutputFormat::Png => {
                self.to_rgba_image()?
                    .save_with_format(&path, image::ImageFormat::Png)?;
            }
            OutputFormat::Gif => {
                self.to_rgba_image()?
                    .save_with_format(&path, image::ImageFormat::Gif)?;
            }
            OutputFormat::Jpeg => {
                let rgba = self.to_rgba_image()?;
                image::DynamicImage::ImageRgba8(rgba)
                    .to_rgb8()
                    .save_with_format(&path, image::ImageFormat::Jpeg)?;
            }
        }
        info!(path = %path.display(), ?format, "saved grid image");
        Ok(path)
    }
}

/// Title lines: `"<display name> - <DETECTOR>"`, then the selected date,
/// suffixed with `vs <reference>` when the reference differs.
#[must_use]
pub fn grid_title(
    factor_type: &str,
    detector: &str,
    selected_date: Option<&str>,
    reference_date: Option<&str>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} - {}",
        factor_display_name(factor_type),
        detector.to_uppercase()
    )];
    match (selected_date, reference_date) {
        (Some(selected), Some(reference)) if selected != reference => {
            lines.push(format!("{selected} vs {reference}"));
        }
        (Some(selected), _) => lines.push(selected.to_owned()),
        (None, _) => {}
    }
    lines
}

/// Label color readable on top of `fill`.
#[must_use]
pub fn label_color_for(fill: Color) -> Color {
    if fill.relative_luminance() < LABEL_LUMINANCE_THRESHOLD {
        Color::WHITE
    } else {
        Color::BLACK
    }
}

/// Lays out one cell per mapping key and builds the drawable frame.
///
/// Keys present in `mapping` but absent from `factors` render at
/// [`DEFAULT_FACTOR_VALUE`]. Factors without a mapping position are ignored.
pub fn render_grid(
    mapping: &ChannelMapping,
    factors: &RenderedFactors,
    options: &GridRenderOptions,
) -> GridResult<GridImage> {
    if !options.viewport.is_valid() {
        return Err(GridError::InvalidViewport {
            width: options.viewport.width,
            height: options.viewport.height,
        });
    }

    if mapping.is_empty() {
        warn!(mapping = %mapping.name(), "mapping has no channels, rendering placeholder");
        return Ok(placeholder(options.viewport));
    }

    let cells: Vec<GridCell> = mapping
        .iter()
        .map(|(key, position)| {
            let (value, defaulted) = match factors.get(key) {
                Some(value) => (*value, false),
                None => (DEFAULT_FACTOR_VALUE, true),
            };
            let normalized = options.range.normalize(value);
            GridCell {
                key: key.clone(),
                position: *position,
                value,
                normalized,
                defaulted,
                fill: options.color_scale.sample(normalized),
            }
        })
        .collect();

    let defaulted = cells.iter().filter(|cell| cell.defaulted).count();
    if defaulted > 0 {
        debug!(mapping = %mapping.name(), defaulted, "mapping keys without extracted factor");
    }

    let title = grid_title(
        &options.factor_type,
        mapping.name(),
        options.selected_date.as_deref(),
        options.reference_date.as_deref(),
    );

    let mut frame = RenderFrame::new(options.viewport);
    push_title(&mut frame, &title);
    push_cells(&mut frame, &cells);
    push_colorbar(&mut frame, options);
    frame.validate()?;
    debug!(
        mapping = %mapping.name(),
        cells = cells.len(),
        primitives = frame.primitive_count(),
        "grid frame built"
    );

    Ok(GridImage {
        title,
        cells,
        frame,
    })
}

fn placeholder(viewport: Viewport) -> GridImage {
    let frame = RenderFrame::new(viewport).with_text(TextPrimitive::new(
        NO_DATA_MESSAGE,
        f64::from(viewport.width) / 2.0,
        f64::from(viewport.height) / 2.0,
        TITLE_FONT_PX,
        Color::BLACK,
        TextHAlign::Center,
    ));
    GridImage {
        title: Vec::new(),
        cells: Vec::new(),
        frame,
    }
}

fn push_title(frame: &mut RenderFrame, title: &[String]) {
    let center_x = f64::from(frame.viewport.width) / 2.0;
    for (index, line) in title.iter().enumerate() {
        frame.texts.push(
            TextPrimitive::new(
                line.clone(),
                center_x,
                TITLE_TOP + TITLE_LINE_HEIGHT * index as f64,
                TITLE_FONT_PX,
                Color::BLACK,
                TextHAlign::Center,
            )
            .bold(),
        );
    }
}

struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

fn plot_area(viewport: Viewport) -> PlotArea {
    let width = f64::from(viewport.width);
    let height = f64::from(viewport.height);
    PlotArea {
        left: PLOT_MARGIN,
        top: PLOT_TOP,
        width: (width - PLOT_MARGIN - COLORBAR_AREA).max(1.0),
        height: (height - PLOT_TOP - PLOT_MARGIN).max(1.0),
    }
}

fn push_cells(frame: &mut RenderFrame, cells: &[GridCell]) {
    let area = plot_area(frame.viewport);

    let (mut min_col, mut max_col) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_row, mut max_row) = (f64::INFINITY, f64::NEG_INFINITY);
    for cell in cells {
        min_col = min_col.min(cell.position.col);
        max_col = max_col.max(cell.position.col);
        min_row = min_row.min(cell.position.row);
        max_row = max_row.max(cell.position.row);
    }

    // Unit cells centred on (col, row), so the extent is one cell wider than the span.
    let cols = max_col - min_col + 1.0;
    let rows = max_row - min_row + 1.0;
    let cell_size = (area.width / cols).min(area.height / rows);
    let origin_x = area.left + (area.width - cell_size * cols) / 2.0;
    let origin_y = area.top + (area.height - cell_size * rows) / 2.0;
    let font_px = (cell_size * 0.28).clamp(MIN_VALUE_FONT_PX, MAX_VALUE_FONT_PX);

    for cell in cells {
        let x = origin_x + (cell.position.col - min_col) * cell_size;
        let y = origin_y + (cell.position.row - min_row) * cell_size;
        frame.rects.push(
            RectPrimitive::new(x, y, cell_size, cell_size, cell.fill)
                .with_border(CELL_BORDER_WIDTH, Color::BLACK),
        );
        frame.texts.push(TextPrimitive::new(
            format!("{:.2}", cell.value),
            x + cell_size / 2.0,
            y + cell_size / 2.0,
            font_px,
            label_color_for(cell.fill),
            TextHAlign::Center,
        ));
    }
}

fn push_colorbar(frame: &mut RenderFrame, options: &GridRenderOptions) {
    let area = plot_area(frame.viewport);
    let bar_height = area.height * 0.8;
    let bar_top = area.top + (area.height - bar_height) / 2.0;
    let bar_left = area.left + area.width + (COLORBAR_AREA - COLORBAR_WIDTH) / 2.0 - 20.0;
    let strip_height = bar_height / COLORBAR_STRIPS as f64;

    // Strips run bottom (min) to top (max).
    for strip in 0..COLORBAR_STRIPS {
        let t = (strip as f64 + 0.5) / COLORBAR_STRIPS as f64;
        let y = bar_top + bar_height - strip_height * (strip as f64 + 1.0);
        frame.rects.push(RectPrimitive::new(
            bar_left,
            y,
            COLORBAR_WIDTH,
            strip_height,
            options.color_scale.sample(t),
        ));
    }
    frame.lines.extend([
        LinePrimitive::new(bar_left, bar_top, bar_left + COLORBAR_WIDTH, bar_top, 1.0, Color::BLACK),
        LinePrimitive::new(
            bar_left,
            bar_top + bar_height,
            bar_left + COLORBAR_WIDTH,
            bar_top + bar_height,
            1.0,
            Color::BLACK,
        ),
        LinePrimitive::new(bar_left, bar_top, bar_left, bar_top + bar_height, 1.0, Color::BLACK),
        LinePrimitive::new(
            bar_left + COLORBAR_WIDTH,
            bar_top,
            bar_left + COLORBAR_WIDTH,
            bar_top + bar_height,
            1.0,
            Color::BLACK,
        ),
    ]);

    let right = bar_left + COLORBAR_WIDTH;
    for tick in options.range.ticks(COLORBAR_TICKS) {
        let y = bar_top + bar_height * (1.0 - options.range.normalize(tick));
        frame
            .lines
            .push(LinePrimitive::new(right, y, right + 5.0, y, 1.0, Color::BLACK));
        frame.texts.push(TextPrimitive::new(
            format!("{tick:.2}"),
            right + 8.0,
            y,
            AXIS_FONT_PX,
            Color::BLACK,
            TextHAlign::Left,
        ));
    }

    let label = factor_display_name(&options.factor_type);
    if label.is_empty() {
        return;
    }
    frame.texts.push(TextPrimitive::new(
        label,
        bar_left + COLORBAR_WIDTH / 2.0,
        bar_top - 16.0,
        AXIS_FONT_PX,
        Color::BLACK,
        TextHAlign::Center,
    ));
}
