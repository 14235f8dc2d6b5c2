use cairo::{Context, Format, ImageSurface};
use image::RgbaImage;
use pango::FontDescription;

use crate::core::Viewport;
use crate::error::{GridError, GridResult};
use crate::render::{Color, RectPrimitive, RenderFrame, Renderer, TextHAlign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CairoRenderStats {
    pub lines_drawn: usize,
    pub rects_drawn: usize,
    pub texts_drawn: usize,
}

/// Optional extension trait for renderers that can draw into an external Cairo
/// context (for example a GTK `DrawingArea` callback).
pub trait CairoContextRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> GridResult<()>;
}

/// Cairo + Pango + PangoCairo renderer backend.
///
/// Renders offscreen into an ARGB32 image surface, which can be converted into
/// an `image::RgbaImage` for PNG/JPEG/GIF encoding.
#[derive(Debug)]
pub struct CairoRenderer {
    surface: ImageSurface,
    last_stats: CairoRenderStats,
}

impl CairoRenderer {
    pub fn new(viewport: Viewport) -> GridResult<Self> {
        Ok(Self {
            surface: create_surface(viewport)?,
            last_stats: CairoRenderStats::default(),
        })
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        "cairo+pango+pangocairo"
    }

    #[must_use]
    pub fn surface(&self) -> &ImageSurface {
        &self.surface
    }

    #[must_use]
    pub fn last_stats(&self) -> CairoRenderStats {
        self.last_stats
    }

    /// Copies the surface into an un-premultiplied RGBA buffer.
    pub fn to_rgba_image(&self) -> GridResult<RgbaImage> {
        self.surface.flush();
        let width = u32::try_from(self.surface.width())
            .map_err(|_| GridError::InvalidData("negative cairo surface width".to_owned()))?;
        let height = u32::try_from(self.surface.height())
            .map_err(|_| GridError::InvalidData("negative cairo surface height".to_owned()))?;
        let stride = usize::try_from(self.surface.stride())
            .map_err(|_| GridError::InvalidData("negative cairo surface stride".to_owned()))?;

        let mut image = RgbaImage::new(width, height);
        self.surface
            .with_data(|data| {
                for (y, row) in data.chunks(stride).take(height as usize).enumerate() {
                    for (x, argb) in row.chunks_exact(4).take(width as usize).enumerate() {
                        let pixel = u32::from_ne_bytes([argb[0], argb[1], argb[2], argb[3]]);
                        image.put_pixel(x as u32, y as u32, image::Rgba(unpremultiply(pixel)));
                    }
                }
            })
            .map_err(|err| GridError::InvalidData(format!("cairo surface not readable: {err}")))?;
        Ok(image)
    }

    fn render_with_context(&mut self, context: &Context, frame: &RenderFrame) -> GridResult<()> {
        frame.validate()?;

        apply_color(context, frame.background);
        context
            .paint()
            .map_err(|err| map_backend_error("failed to clear surface", err))?;

        let mut stats = CairoRenderStats::default();

        for rect in &frame.rects {
            append_rect_path(context, *rect);
            apply_color(context, rect.fill_color);
            if rect.border_width > 0.0 {
                context
                    .fill_preserve()
                    .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
                apply_color(context, rect.border_color);
                context.set_line_width(rect.border_width);
                context
                    .stroke()
                    .map_err(|err| map_backend_error("failed to stroke rectangle border", err))?;
            } else {
                context
                    .fill()
                    .map_err(|err| map_backend_error("failed to fill rectangle", err))?;
            }
            stats.rects_drawn += 1;
        }

        for line in &frame.lines {
            apply_color(context, line.color);
            context.set_line_width(line.stroke_width);
            context.move_to(line.x1, line.y1);
            context.line_to(line.x2, line.y2);
            context
                .stroke()
                .map_err(|err| map_backend_error("failed to stroke line", err))?;
            stats.lines_drawn += 1;
        }

        for text in &frame.texts {
            let layout = pangocairo::functions::create_layout(context);
            let weight = if text.bold { "Bold " } else { "" };
            let font_description =
                FontDescription::from_string(&format!("Sans {weight}{}px", text.font_size_px));
            layout.set_font_description(Some(&font_description));
            layout.set_text(&text.text);

            let (text_width, text_height) = layout.pixel_size();
            let x = match text.h_align {
                TextHAlign::Left => text.x,
                TextHAlign::Center => text.x - f64::from(text_width) / 2.0,
                TextHAlign::Right => text.x - f64::from(text_width),
            };
            let y = text.y - f64::from(text_height) / 2.0;

            apply_color(context, text.color);
            context.move_to(x, y);
            pangocairo::functions::show_layout(context, &layout);
            stats.texts_drawn += 1;
        }

        self.last_stats = stats;
        Ok(())
    }
}

impl Renderer for CairoRenderer {
    fn render(&mut self, frame: &RenderFrame) -> GridResult<()> {
        if self.surface.width() != frame.viewport.width as i32
            || self.surface.height() != frame.viewport.height as i32
        {
            self.surface = create_surface(frame.viewport)?;
        }
        let context = Context::new(&self.surface)
            .map_err(|err| map_backend_error("failed to create cairo context", err))?;
        self.render_with_context(&context, frame)
    }
}

impl CairoContextRenderer for CairoRenderer {
    fn render_on_cairo_context(
        &mut self,
        context: &Context,
        frame: &RenderFrame,
    ) -> GridResult<()> {
        self.render_with_context(context, frame)
    }
}

fn create_surface(viewport: Viewport) -> GridResult<ImageSurface> {
    let (Ok(width), Ok(height)) = (i32::try_from(viewport.width), i32::try_from(viewport.height))
    else {
        return Err(GridError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    };
    if width <= 0 || height <= 0 {
        return Err(GridError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    ImageSurface::create(Format::ARgb32, width, height)
        .map_err(|err| map_backend_error("failed to create cairo surface", err))
}

fn unpremultiply(argb: u32) -> [u8; 4] {
    let alpha = (argb >> 24) & 0xFF;
    if alpha == 0 {
        return [0, 0, 0, 0];
    }
    let channel = |shift: u32| {
        let premultiplied = (argb >> shift) & 0xFF;
        ((premultiplied * 255 + alpha / 2) / alpha).min(255) as u8
    };
    [channel(16), channel(8), channel(0), alpha as u8]
}

fn apply_color(context: &Context, color: Color) {
    context.set_source_rgba(color.red, color.green, color.blue, color.alpha);
}

fn append_rect_path(context: &Context, rect: RectPrimitive) {
    context.rectangle(rect.x, rect.y, rect.width, rect.height);
}

fn map_backend_error(prefix: &str, err: cairo::Error) -> GridError {
    GridError::InvalidData(format!("{prefix}: {err}"))
}
