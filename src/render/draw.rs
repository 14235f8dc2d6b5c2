use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend, PathElement, Rectangle, Text};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{Color as PlottersColor, FontDesc, FontFamily, FontStyle, RGBAColor};

use crate::error::{GridError, GridResult};
use crate::render::{Color, LinePrimitive, RectPrimitive, RenderFrame, TextHAlign, TextPrimitive};

/// Primitive counts of the last frame a plotters-backed renderer drew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStats {
    pub rects_drawn: usize,
    pub lines_drawn: usize,
    pub texts_drawn: usize,
}

/// Paints a validated frame onto any plotters drawing area.
///
/// Order is background, rects (fill then border), lines, texts, so labels
/// always land on top of the cell they describe.
pub(crate) fn draw_frame<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    frame: &RenderFrame,
) -> GridResult<DrawStats> {
    area.fill(&plotters_color(frame.background))
        .map_err(|err| GridError::Draw(err.to_string()))?;

    let mut stats = DrawStats::default();
    for rect in &frame.rects {
        draw_rect(area, rect)?;
        stats.rects_drawn += 1;
    }
    for line in &frame.lines {
        draw_line(area, line)?;
        stats.lines_drawn += 1;
    }
    for text in &frame.texts {
        draw_text(area, text)?;
        stats.texts_drawn += 1;
    }
    Ok(stats)
}

fn draw_rect<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, rect: &RectPrimitive) -> GridResult<()> {
    let right = rect.x + rect.width;
    let bottom = rect.y + rect.height;
    fill_band(area, (rect.x, rect.y), (right, bottom), rect.fill_color)?;

    if rect.border_width > 0.0 {
        let half = rect.border_width / 2.0;
        let color = rect.border_color;
        fill_band(area, (rect.x - half, rect.y - half), (right + half, rect.y + half), color)?;
        fill_band(area, (rect.x - half, bottom - half), (right + half, bottom + half), color)?;
        fill_band(area, (rect.x - half, rect.y + half), (rect.x + half, bottom - half), color)?;
        fill_band(area, (right - half, rect.y + half), (right + half, bottom - half), color)?;
    }
    Ok(())
}

fn fill_band<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    upper_left: (f64, f64),
    bottom_right: (f64, f64),
    color: Color,
) -> GridResult<()> {
    let corners = [pixel(upper_left), pixel(bottom_right)];
    if corners[0].0 >= corners[1].0 || corners[0].1 >= corners[1].1 {
        return Ok(());
    }
    area.draw(&Rectangle::new(corners, plotters_color(color).filled()))
        .map_err(|err| GridError::Draw(err.to_string()))
}

fn draw_line<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, line: &LinePrimitive) -> GridResult<()> {
    let width = line.stroke_width.round().max(1.0) as u32;
    let style = plotters_color(line.color).stroke_width(width);
    let points = vec![pixel((line.x1, line.y1)), pixel((line.x2, line.y2))];
    area.draw(&PathElement::new(points, style))
        .map_err(|err| GridError::Draw(err.to_string()))
}

fn draw_text<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, text: &TextPrimitive) -> GridResult<()> {
    let weight = if text.bold { FontStyle::Bold } else { FontStyle::Normal };
    let anchor = match text.h_align {
        TextHAlign::Left => HPos::Left,
        TextHAlign::Center => HPos::Center,
        TextHAlign::Right => HPos::Right,
    };
    let style = FontDesc::new(FontFamily::SansSerif, text.font_size_px, weight)
        .color(&plotters_color(text.color))
        .pos(Pos::new(anchor, VPos::Center));
    area.draw(&Text::new(text.text.as_str(), pixel((text.x, text.y)), style))
        .map_err(|err| GridError::Draw(err.to_string()))
}

fn plotters_color(color: Color) -> RGBAColor {
    let [red, green, blue, _] = color.to_rgba8();
    RGBAColor(red, green, blue, color.alpha.clamp(0.0, 1.0))
}

fn pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}
