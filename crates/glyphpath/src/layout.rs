// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line layout of styled text.
//!
//! Text is split into paragraphs at `\n`, every paragraph is shaped piece by
//! piece (one piece per attribute run) and the resulting glyph clusters are
//! broken into lines greedily.

use std::ops::Range;
use std::sync::Arc;

use tiny_skia_path::Path;

use crate::shaper::{LineMetrics, Shaper};
use crate::{Alignment, AttributedString, Attributes, Error, LineBreak, LAYOUT_EPSILON};

/// Layout constraints.
///
/// `None` means unconstrained.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Constraints {
    /// Lines are wrapped to this width.
    pub max_width: Option<f32>,
    /// Lines that do not fit entirely are dropped.
    pub max_height: Option<f32>,
}

impl Constraints {
    /// No constraints, text is laid out at its natural size.
    pub const NATURAL: Constraints = Constraints {
        max_width: None,
        max_height: None,
    };

    fn validate(&self) -> Result<(), Error> {
        let check = |name, value: Option<f32>| match value {
            Some(v) if !v.is_finite() || v < 0.0 => Err(Error::invalid(
                name,
                format!("must be non-negative and finite, got {}", v),
            )),
            _ => Ok(()),
        };

        check("max width", self.max_width)?;
        check("max height", self.max_height)
    }
}

/// A glyph placed relative to the start of its cluster on the baseline.
#[derive(Clone, Debug)]
pub struct PlacedGlyph {
    /// Horizontal position relative to the cluster start.
    pub x: f32,
    /// Vertical position relative to the baseline, y-down.
    pub y: f32,
    /// Glyph outline in pixels.
    pub outline: Option<Arc<Path>>,
}

/// An unbreakable group of glyphs.
#[derive(Clone, Debug)]
pub struct Cluster {
    /// Byte range in the laid out text.
    pub range: Range<usize>,
    /// Total advance, including kerning.
    pub advance: f32,
    /// The cluster consists of whitespace only.
    pub whitespace: bool,
    /// Glyphs in visual order.
    pub glyphs: Vec<PlacedGlyph>,
    metrics: LineMetrics,
}

/// A laid out line.
#[derive(Clone, Debug)]
pub struct Line {
    /// Byte range in the laid out text, without the line break.
    pub range: Range<usize>,
    /// Offset of the line's top edge from the layout top.
    pub top: f32,
    /// Offset of the first cluster from the layout left edge.
    pub x: f32,
    /// Line width without trailing whitespace.
    pub width: f32,
    /// Line metrics.
    pub metrics: LineMetrics,
    /// Clusters in visual order.
    pub clusters: Vec<Cluster>,
    alignment: Alignment,
}

impl Line {
    /// Returns the baseline offset from the layout top.
    #[inline]
    pub fn baseline(&self) -> f32 {
        self.top + self.metrics.ascent
    }

    /// Returns the line bottom offset from the layout top.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.metrics.height()
    }
}

/// Laid out text.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    /// Lines from top to bottom.
    pub lines: Vec<Line>,
    /// Width of the widest line.
    pub width: f32,
    /// Bottom of the last line.
    pub height: f32,
    /// Some lines were dropped because of the height constraint.
    pub truncated: bool,
}

/// Lays out text.
pub fn layout(
    text: &AttributedString,
    constraints: &Constraints,
    shaper: &dyn Shaper,
) -> Result<Layout, Error> {
    text.validate()?;
    constraints.validate()?;

    let mut lines = Vec::new();
    for paragraph in paragraphs(text.as_str()) {
        let attrs = text.attributes_at(paragraph.start);
        let clusters = shape_paragraph(text, paragraph.clone(), shaper)?;

        if clusters.is_empty() {
            let metrics = shaper.shape("", &attrs.font)?.metrics;
            lines.push(new_line(paragraph, Vec::new(), metrics, attrs));
            continue;
        }

        break_lines(clusters, constraints.max_width, attrs, &mut lines);
    }

    let mut layout = Layout::default();
    let mut y = 0.0;
    let mut spacing = 0.0;
    for mut line in lines {
        if !layout.lines.is_empty() {
            y += spacing;
        }

        if let Some(max_height) = constraints.max_height {
            if y + line.metrics.height() > max_height + LAYOUT_EPSILON {
                log::debug!(
                    "Dropping lines from byte {} onwards, they do not fit {}px.",
                    line.range.start,
                    max_height
                );
                layout.truncated = true;
                break;
            }
        }

        spacing = text.attributes_at(line.range.start).paragraph.line_spacing;
        line.top = y;
        y += line.metrics.height();
        layout.width = layout.width.max(line.width);
        layout.lines.push(line);
    }
    layout.height = y;

    layout.align(constraints.max_width.unwrap_or(layout.width));
    Ok(layout)
}

impl Layout {
    /// Positions lines horizontally inside `available` pixels.
    ///
    /// [`layout`] aligns against the maximum width, or the natural width
    /// when there is none. Call this to align against a different width.
    pub fn align(&mut self, available: f32) {
        for line in &mut self.lines {
            let free = (available - line.width).max(0.0);
            line.x = match line.alignment {
                Alignment::Natural | Alignment::Left => 0.0,
                Alignment::Center => free / 2.0,
                Alignment::Right => free,
            };
        }
    }
}

/// Splits text at `\n`, dropping the terminators. `\r\n` is a single break.
fn paragraphs(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices('\n') {
        let end = if text[..idx].ends_with('\r') { idx - 1 } else { idx };
        ranges.push(start..end.max(start));
        start = idx + 1;
    }
    ranges.push(start..text.len());
    ranges
}

fn shape_paragraph(
    text: &AttributedString,
    paragraph: Range<usize>,
    shaper: &dyn Shaper,
) -> Result<Vec<Cluster>, Error> {
    let mut clusters = Vec::new();

    for (range, attrs) in text.pieces(paragraph) {
        let piece = &text.as_str()[range.clone()];
        let run = shaper.shape(piece, &attrs.font)?;

        let first = clusters.len();
        for glyph in run.glyphs {
            let start = range.start + glyph.cluster;
            let in_piece = clusters.len() > first;
            match clusters.last_mut() {
                Some(Cluster {
                    range: cluster_range,
                    advance,
                    glyphs,
                    ..
                }) if in_piece && cluster_range.start == start => {
                    glyphs.push(PlacedGlyph {
                        x: *advance + glyph.x_offset,
                        y: glyph.y_offset,
                        outline: glyph.outline,
                    });
                    *advance += glyph.advance;
                }
                _ => clusters.push(Cluster {
                    range: start..start,
                    advance: glyph.advance,
                    whitespace: false,
                    glyphs: vec![PlacedGlyph {
                        x: glyph.x_offset,
                        y: glyph.y_offset,
                        outline: glyph.outline,
                    }],
                    metrics: run.metrics,
                }),
            }
        }

        let piece_clusters = &mut clusters[first..];
        let mut starts: Vec<usize> = piece_clusters.iter().map(|c| c.range.start).collect();
        starts.sort_unstable();
        starts.dedup();

        for cluster in piece_clusters {
            let next = starts.partition_point(|&s| s <= cluster.range.start);
            cluster.range.end = starts.get(next).copied().unwrap_or(range.end);
            cluster.whitespace = text.as_str()[cluster.range.clone()]
                .chars()
                .all(char::is_whitespace);
            cluster.advance += attrs.kern;
        }
    }

    Ok(clusters)
}

fn break_lines(
    mut clusters: Vec<Cluster>,
    max_width: Option<f32>,
    attrs: &Attributes,
    lines: &mut Vec<Line>,
) {
    let mut breaks = Vec::new();

    if let Some(max_width) = max_width {
        let mut line_start = 0;
        let mut width = 0.0;
        let mut last_break = None;

        for (i, cluster) in clusters.iter().enumerate() {
            let overflows = width + cluster.advance > max_width + LAYOUT_EPSILON;
            if !cluster.whitespace && i > line_start && overflows {
                let at = match (attrs.paragraph.line_break, last_break) {
                    (LineBreak::WordWrap, Some(b)) if b > line_start => b,
                    _ => i,
                };

                breaks.push(at);
                line_start = at;
                width = clusters[at..i].iter().map(|c| c.advance).sum();
                last_break = None;
            }

            width += cluster.advance;
            if cluster.whitespace {
                last_break = Some(i + 1);
            }
        }
    }

    let mut taken = 0;
    for at in breaks.into_iter().chain(std::iter::once(clusters.len())) {
        let line_clusters: Vec<Cluster> = clusters.drain(..at - taken).collect();
        taken = at;

        let range = line_clusters.iter().map(|c| c.range.start).min().unwrap_or(0)
            ..line_clusters.iter().map(|c| c.range.end).max().unwrap_or(0);
        let metrics = line_clusters
            .iter()
            .map(|c| c.metrics)
            .reduce(LineMetrics::max)
            .unwrap_or_default();

        lines.push(new_line(range, line_clusters, metrics, attrs));
    }
}

fn new_line(
    range: Range<usize>,
    clusters: Vec<Cluster>,
    metrics: LineMetrics,
    attrs: &Attributes,
) -> Line {
    let visible = clusters
        .iter()
        .rposition(|c| !c.whitespace)
        .map_or(0, |idx| idx + 1);
    let width = clusters[..visible].iter().map(|c| c.advance).sum();

    Line {
        range,
        top: 0.0,
        x: 0.0,
        width,
        metrics,
        clusters,
        alignment: attrs.paragraph.alignment,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BoxShaper, Font, ParagraphStyle};

    fn text(s: &str, size: f32) -> AttributedString {
        AttributedString::new(s, Attributes::with_font(Font::with_size(size)))
    }

    fn line_texts<'a>(s: &'a AttributedString, layout: &Layout) -> Vec<&'a str> {
        layout.lines.iter().map(|l| &s.as_str()[l.range.clone()]).collect()
    }

    #[test]
    fn splits_paragraphs() {
        assert_eq!(paragraphs("a\nbc\r\n\nd"), vec![0..1, 2..4, 6..6, 7..8]);
        assert_eq!(paragraphs(""), vec![0..0]);
    }

    #[test]
    fn natural_layout() {
        // 10px box shaper: 6px advance, 10px line height.
        let s = text("ab\ncde", 10.0);
        let layout = layout(&s, &Constraints::NATURAL, &BoxShaper).unwrap();

        assert_eq!(line_texts(&s, &layout), vec!["ab", "cde"]);
        assert!((layout.width - 18.0).abs() < 1e-4);
        assert!((layout.height - 20.0).abs() < 1e-4);
        assert!((layout.lines[1].baseline() - 18.0).abs() < 1e-4);
    }

    #[test]
    fn word_wrap() {
        let s = text("aa bb cc", 10.0);
        let constraints = Constraints {
            max_width: Some(31.0),
            max_height: None,
        };
        let layout = layout(&s, &constraints, &BoxShaper).unwrap();

        assert_eq!(line_texts(&s, &layout), vec!["aa bb ", "cc"]);
        // Trailing whitespace hangs.
        assert!((layout.lines[0].width - 30.0).abs() < 1e-4);
    }

    #[test]
    fn long_words_break_by_character() {
        let s = text("abcdefgh", 10.0);
        let constraints = Constraints {
            max_width: Some(25.0),
            max_height: None,
        };
        let layout = layout(&s, &constraints, &BoxShaper).unwrap();

        assert_eq!(line_texts(&s, &layout), vec!["abcd", "efgh"]);
    }

    #[test]
    fn char_wrap() {
        let mut attrs = Attributes::with_font(Font::with_size(10.0));
        attrs.paragraph.line_break = LineBreak::CharWrap;
        let s = AttributedString::new("aa bb", attrs);
        let constraints = Constraints {
            max_width: Some(25.0),
            max_height: None,
        };
        let layout = layout(&s, &constraints, &BoxShaper).unwrap();

        assert_eq!(line_texts(&s, &layout), vec!["aa b", "b"]);
    }

    #[test]
    fn zero_width_keeps_one_cluster_per_line() {
        let s = text("abc", 10.0);
        let constraints = Constraints {
            max_width: Some(0.0),
            max_height: None,
        };
        let layout = layout(&s, &constraints, &BoxShaper).unwrap();
        assert_eq!(layout.lines.len(), 3);
    }

    #[test]
    fn height_truncates() {
        let s = text("a\nb\nc", 10.0);
        let constraints = Constraints {
            max_width: None,
            max_height: Some(25.0),
        };
        let layout = layout(&s, &constraints, &BoxShaper).unwrap();

        assert_eq!(layout.lines.len(), 2);
        assert!(layout.truncated);
        assert!(layout.height <= 25.0);
    }

    #[test]
    fn alignment_and_spacing() {
        let attrs = Attributes {
            font: Font::with_size(10.0),
            paragraph: ParagraphStyle {
                alignment: Alignment::Right,
                line_spacing: 4.0,
                ..ParagraphStyle::default()
            },
            ..Attributes::default()
        };
        let s = AttributedString::new("abc\na", attrs);
        let layout = layout(&s, &Constraints::NATURAL, &BoxShaper).unwrap();

        assert_eq!(layout.lines[0].x, 0.0);
        assert!((layout.lines[1].x - 12.0).abs() < 1e-4);
        assert!((layout.lines[1].top - 14.0).abs() < 1e-4);
        assert!((layout.height - 24.0).abs() < 1e-4);
    }

    #[test]
    fn realign_to_natural_width() {
        let attrs = Attributes {
            font: Font::with_size(10.0),
            paragraph: ParagraphStyle {
                alignment: Alignment::Center,
                ..ParagraphStyle::default()
            },
            ..Attributes::default()
        };
        let s = AttributedString::new("ab", attrs);
        let constraints = Constraints {
            max_width: Some(100.0),
            max_height: None,
        };
        let mut layout = layout(&s, &constraints, &BoxShaper).unwrap();
        assert!((layout.lines[0].x - 44.0).abs() < 1e-4);

        layout.align(layout.width);
        assert_eq!(layout.lines[0].x, 0.0);
    }

    #[test]
    fn kern_extends_advances() {
        let mut attrs = Attributes::with_font(Font::with_size(10.0));
        attrs.kern = 2.0;
        let s = AttributedString::new("ab", attrs);
        let layout = layout(&s, &Constraints::NATURAL, &BoxShaper).unwrap();

        assert!((layout.width - 16.0).abs() < 1e-4);
    }

    #[test]
    fn empty_paragraph_takes_font_height() {
        let s = text("a\n\nb", 20.0);
        let layout = layout(&s, &Constraints::NATURAL, &BoxShaper).unwrap();

        assert_eq!(layout.lines.len(), 3);
        assert!(layout.lines[1].clusters.is_empty());
        assert!((layout.height - 60.0).abs() < 1e-3);
    }

    #[test]
    fn mixed_sizes_share_a_line() {
        let mut s = text("a", 10.0);
        s.push_str("b", Attributes::with_font(Font::with_size(30.0)));
        let layout = layout(&s, &Constraints::NATURAL, &BoxShaper).unwrap();

        assert_eq!(layout.lines.len(), 1);
        assert!((layout.lines[0].metrics.ascent - 24.0).abs() < 1e-4);
        assert!((layout.width - 24.0).abs() < 1e-4);
    }

    #[test]
    fn rejects_bad_constraints() {
        let s = text("a", 10.0);
        let constraints = Constraints {
            max_width: Some(f32::NAN),
            max_height: None,
        };
        assert!(matches!(
            layout(&s, &constraints, &BoxShaper),
            Err(Error::InvalidParameter { .. })
        ));
    }
}
