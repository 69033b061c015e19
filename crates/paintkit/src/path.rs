// Copyright 2019 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use glyphpath::Color;

use crate::ImageError;

/// A fill rule.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FillRule {
    /// Glyph outlines use this one.
    #[default]
    NonZero,
    #[allow(missing_docs)]
    EvenOdd,
}

/// Path fill parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Fill {
    /// Fill color.
    pub color: Color,
    /// Fill rule.
    pub rule: FillRule,
    /// Anti-alias edges.
    pub anti_alias: bool,
}

impl Default for Fill {
    fn default() -> Self {
        Fill {
            color: Color::black(),
            rule: FillRule::NonZero,
            anti_alias: true,
        }
    }
}

impl Fill {
    /// Creates an anti-aliased non-zero fill.
    pub fn from_color(color: Color) -> Self {
        Fill {
            color,
            ..Fill::default()
        }
    }
}

/// Path stroke parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Stroke {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels before transformation.
    pub width: f32,
    /// Round caps and joins, like a brush. Otherwise butt caps and miter joins.
    pub round: bool,
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke {
            color: Color::black(),
            width: 1.0,
            round: true,
        }
    }
}

fn to_paint(color: Color, anti_alias: bool) -> tiny_skia::Paint<'static> {
    let mut paint = tiny_skia::Paint::default();
    paint.set_color_rgba8(color.red, color.green, color.blue, color.alpha);
    paint.anti_alias = anti_alias;
    paint
}

pub(crate) fn fill_path(
    path: &tiny_skia::Path,
    fill: &Fill,
    transform: tiny_skia::Transform,
    pixmap: &mut tiny_skia::PixmapMut,
) -> Result<(), ImageError> {
    // Horizontal and vertical lines cannot be filled.
    if path.bounds().width() == 0.0 || path.bounds().height() == 0.0 {
        return Err(ImageError::EmptyPath);
    }

    let rule = match fill.rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    };

    let paint = to_paint(fill.color, fill.anti_alias);
    pixmap.fill_path(path, &paint, rule, transform, None);
    Ok(())
}

pub(crate) fn stroke_path(
    path: &tiny_skia::Path,
    stroke: &Stroke,
    transform: tiny_skia::Transform,
    pixmap: &mut tiny_skia::PixmapMut,
) -> Result<(), ImageError> {
    if !stroke.width.is_finite() || stroke.width <= 0.0 {
        return Err(ImageError::InvalidStroke(stroke.width));
    }

    let (line_cap, line_join) = if stroke.round {
        (tiny_skia::LineCap::Round, tiny_skia::LineJoin::Round)
    } else {
        (tiny_skia::LineCap::Butt, tiny_skia::LineJoin::Miter)
    };

    let ts_stroke = tiny_skia::Stroke {
        width: stroke.width,
        line_cap,
        line_join,
        ..tiny_skia::Stroke::default()
    };

    let paint = to_paint(stroke.color, true);
    pixmap.stroke_path(path, &paint, &ts_stroke, transform, None);
    Ok(())
}
