// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt::Write;
use std::sync::Arc;

use tiny_skia_path::{Path, PathBuilder, PathSegment, Rect, Size, Transform};

use crate::layout::{self, Constraints, Layout};
use crate::{Attributes, AttributedString, Error, Font, Shaper};

/// Glyph outlines of laid out text.
///
/// All contours are closed. Coordinates are y-down.
#[derive(Clone, Debug)]
pub struct GlyphPath {
    data: Option<Arc<Path>>,
    layout_rect: Rect,
    line_count: usize,
    truncated: bool,
}

impl GlyphPath {
    /// Returns the path data.
    ///
    /// `None` when the text has no visible glyphs.
    #[inline]
    pub fn data(&self) -> Option<&Path> {
        self.data.as_deref()
    }

    /// Checks that there are no outlines.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    /// Returns the rectangle the text was laid out in.
    ///
    /// For natural layouts this is the natural text size at the origin.
    #[inline]
    pub fn layout_rect(&self) -> Rect {
        self.layout_rect
    }

    /// Returns the number of laid out lines.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Checks that some lines did not fit the layout height.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the bounding box of all points, including control points.
    ///
    /// Always contains [`GlyphPath::tight_bounds`].
    pub fn bounds(&self) -> Option<Rect> {
        self.data.as_ref().map(|path| path.bounds())
    }

    /// Returns the exact bounding box of the outlines.
    pub fn tight_bounds(&self) -> Option<Rect> {
        use kurbo::Shape;

        let bbox = self.to_bez_path()?.bounding_box();
        Rect::from_ltrb(bbox.x0 as f32, bbox.y0 as f32, bbox.x1 as f32, bbox.y1 as f32)
    }

    /// Returns the number of contours.
    pub fn contour_count(&self) -> usize {
        self.data.as_ref().map_or(0, |path| {
            path.segments()
                .filter(|seg| matches!(seg, PathSegment::MoveTo(_)))
                .count()
        })
    }

    /// Converts the outlines into a kurbo path.
    pub fn to_bez_path(&self) -> Option<kurbo::BezPath> {
        let path = self.data.as_ref()?;

        let mut bez = kurbo::BezPath::new();
        for seg in path.segments() {
            match seg {
                PathSegment::MoveTo(p) => bez.move_to((p.x as f64, p.y as f64)),
                PathSegment::LineTo(p) => bez.line_to((p.x as f64, p.y as f64)),
                PathSegment::QuadTo(p1, p) => {
                    bez.quad_to((p1.x as f64, p1.y as f64), (p.x as f64, p.y as f64))
                }
                PathSegment::CubicTo(p1, p2, p) => bez.curve_to(
                    (p1.x as f64, p1.y as f64),
                    (p2.x as f64, p2.y as f64),
                    (p.x as f64, p.y as f64),
                ),
                PathSegment::Close => bez.close_path(),
            }
        }

        Some(bez)
    }

    /// Writes the outlines as SVG path data.
    ///
    /// Returns an empty string for an empty path.
    pub fn to_svg_data(&self) -> String {
        let mut s = String::new();
        let Some(path) = self.data.as_ref() else {
            return s;
        };

        for seg in path.segments() {
            // Writing into a String never fails.
            let _ = match seg {
                PathSegment::MoveTo(p) => write!(s, "M {} {} ", p.x, p.y),
                PathSegment::LineTo(p) => write!(s, "L {} {} ", p.x, p.y),
                PathSegment::QuadTo(p1, p) => write!(s, "Q {} {} {} {} ", p1.x, p1.y, p.x, p.y),
                PathSegment::CubicTo(p1, p2, p) => write!(
                    s,
                    "C {} {} {} {} {} {} ",
                    p1.x, p1.y, p2.x, p2.y, p.x, p.y
                ),
                PathSegment::Close => write!(s, "Z "),
            };
        }

        s.pop();
        s
    }

    /// Returns a transformed copy.
    ///
    /// The layout rectangle is transformed too.
    pub fn transform(&self, ts: Transform) -> Option<GlyphPath> {
        let data = match self.data.as_ref() {
            Some(path) => Some(Arc::new(path.as_ref().clone().transform(ts)?)),
            None => None,
        };

        let mut corners = [
            tiny_skia_path::Point::from_xy(self.layout_rect.left(), self.layout_rect.top()),
            tiny_skia_path::Point::from_xy(self.layout_rect.right(), self.layout_rect.bottom()),
        ];
        ts.map_points(&mut corners);
        let layout_rect = Rect::from_ltrb(
            corners[0].x.min(corners[1].x),
            corners[0].y.min(corners[1].y),
            corners[0].x.max(corners[1].x),
            corners[0].y.max(corners[1].y),
        )?;

        Some(GlyphPath {
            data,
            layout_rect,
            line_count: self.line_count,
            truncated: self.truncated,
        })
    }
}

/// Lays text out inside `rect` and returns its outlines.
///
/// Lines are wrapped at the rect width and lines that do not fit its height
/// are dropped whole. Glyphs are not clipped to the rect.
///
/// A rect shorter than the first line therefore produces an empty path,
/// marked as truncated.
pub fn path_in_rect(
    text: &AttributedString,
    rect: Rect,
    shaper: &dyn Shaper,
) -> Result<GlyphPath, Error> {
    let constraints = Constraints {
        max_width: Some(rect.width()),
        max_height: Some(rect.height()),
    };

    let layout = layout::layout(text, &constraints, shaper)?;
    let data = assemble(&layout, Transform::from_translate(rect.x(), rect.y()), None);
    Ok(GlyphPath::new(data, rect, &layout))
}

/// Lays text out at its natural size and returns its outlines.
///
/// Only explicit line breaks start new lines. The layout rectangle starts at
/// the origin.
pub fn path(text: &AttributedString, shaper: &dyn Shaper) -> Result<GlyphPath, Error> {
    let layout = layout::layout(text, &Constraints::NATURAL, shaper)?;
    let rect = layout_rect(layout.width, layout.height)?;
    let data = assemble(&layout, Transform::identity(), None);
    Ok(GlyphPath::new(data, rect, &layout))
}

/// Lays text out at its natural size limited by `max_size`.
///
/// Lines are wrapped at the maximum width and truncated at the maximum
/// height. Glyphs whose outlines would still reach outside of
/// `0..width x 0..height`, like overhanging italics or a single character
/// wider than the maximum width, are dropped. The resulting bounds never
/// exceed `max_size`.
///
/// Lines are aligned inside the resulting layout rectangle, not inside
/// `max_size`.
pub fn path_with_max_size(
    text: &AttributedString,
    max_size: Size,
    shaper: &dyn Shaper,
) -> Result<GlyphPath, Error> {
    let constraints = Constraints {
        max_width: Some(max_size.width()),
        max_height: Some(max_size.height()),
    };

    let mut layout = layout::layout(text, &constraints, shaper)?;
    let rect = layout_rect(
        layout.width.min(max_size.width()),
        layout.height.min(max_size.height()),
    )?;
    layout.align(rect.width());
    let data = assemble(&layout, Transform::identity(), Some(max_size));
    Ok(GlyphPath::new(data, rect, &layout))
}

/// Lays out a single line of unstyled text.
///
/// Line breaks are replaced with spaces. The default font family is used.
pub fn single_line_path(
    text: &str,
    font_size: f32,
    shaper: &dyn Shaper,
) -> Result<GlyphPath, Error> {
    let font = Font::with_size(font_size);
    font.validate()?;

    let line = text.replace("\r\n", " ").replace(['\n', '\r'], " ");
    path(&AttributedString::new(line, Attributes::with_font(font)), shaper)
}

impl GlyphPath {
    fn new(data: Option<Path>, layout_rect: Rect, layout: &Layout) -> Self {
        GlyphPath {
            data: data.map(Arc::new),
            layout_rect,
            line_count: layout.lines.len(),
            truncated: layout.truncated,
        }
    }
}

fn layout_rect(width: f32, height: f32) -> Result<Rect, Error> {
    Rect::from_xywh(0.0, 0.0, width, height).ok_or_else(|| {
        Error::invalid(
            "layout size",
            format!("{}x{} is not a valid size", width, height),
        )
    })
}

/// Places glyph outlines of every line into a single path.
fn assemble(layout: &Layout, ts: Transform, clip: Option<Size>) -> Option<Path> {
    let mut builder = PathBuilder::new();

    for line in &layout.lines {
        let baseline = line.baseline();
        let mut x = line.x;

        for cluster in &line.clusters {
            for glyph in &cluster.glyphs {
                let Some(outline) = glyph.outline.as_ref() else {
                    continue;
                };

                let glyph_ts = Transform::from_translate(x + glyph.x, baseline + glyph.y);
                let Some(path) = outline.as_ref().clone().transform(glyph_ts) else {
                    continue;
                };

                if let Some(clip) = clip {
                    let bbox = path.bounds();
                    if bbox.left() < 0.0
                        || bbox.top() < 0.0
                        || bbox.right() > clip.width()
                        || bbox.bottom() > clip.height()
                    {
                        log::debug!(
                            "Glyph at byte {} does not fit {}x{}. Skipped.",
                            cluster.range.start,
                            clip.width(),
                            clip.height()
                        );
                        continue;
                    }
                }

                builder.push_path(&path);
            }

            x += cluster.advance;
        }
    }

    builder.finish()?.transform(ts)
}
