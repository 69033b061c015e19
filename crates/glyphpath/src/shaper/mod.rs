// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text shaping and glyph outline extraction.
//!
//! A [`Shaper`] turns a run of text with a single font request into
//! positioned glyphs with outlines. Everything above it (attributes, line
//! breaking, path assembly) is font-library agnostic.

use std::sync::Arc;

use tiny_skia_path::Path;

use crate::{Font, LayoutError};

mod boxes;
#[cfg(feature = "fonts")]
mod fontdb;
#[cfg(feature = "fonts")]
mod metrics;

pub use boxes::BoxShaper;
#[cfg(feature = "fonts")]
pub use self::fontdb::FontdbShaper;

/// Vertical metrics of a shaped run, in pixels.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LineMetrics {
    /// Distance from the baseline to the top of the line. Positive.
    pub ascent: f32,
    /// Distance from the baseline to the bottom of the line. Positive.
    pub descent: f32,
    /// Recommended extra gap between lines.
    pub line_gap: f32,
}

impl LineMetrics {
    /// Returns the line height.
    #[inline]
    pub fn height(&self) -> f32 {
        self.ascent + self.descent + self.line_gap
    }

    /// Returns per-component maximum of two metrics.
    pub fn max(self, other: LineMetrics) -> LineMetrics {
        LineMetrics {
            ascent: self.ascent.max(other.ascent),
            descent: self.descent.max(other.descent),
            line_gap: self.line_gap.max(other.line_gap),
        }
    }
}

/// A positioned glyph.
#[derive(Clone, Debug)]
pub struct ShapedGlyph {
    /// Byte offset of the first character of the glyph cluster,
    /// relative to the shaped text.
    pub cluster: usize,
    /// Horizontal advance in pixels.
    pub advance: f32,
    /// Horizontal offset from the pen position in pixels.
    pub x_offset: f32,
    /// Vertical offset from the baseline in pixels, y-down.
    pub y_offset: f32,
    /// Glyph outline in pixels, relative to the glyph origin on the baseline, y-down.
    ///
    /// `None` for glyphs without contours, like spaces.
    pub outline: Option<Arc<Path>>,
}

/// The result of shaping a single run.
#[derive(Clone, Debug, Default)]
pub struct ShapedRun {
    /// Glyphs in visual order.
    pub glyphs: Vec<ShapedGlyph>,
    /// Metrics of the run's font.
    pub metrics: LineMetrics,
}

/// A text shaping and path extraction capability.
///
/// Implementations must be deterministic: the same text and font
/// must always produce the same glyphs.
pub trait Shaper: Send + Sync {
    /// Shapes a run of text that contains no line breaks.
    ///
    /// An empty `text` must still report the font metrics.
    fn shape(&self, text: &str, font: &Font) -> Result<ShapedRun, LayoutError>;
}

impl<T: Shaper + ?Sized> Shaper for Arc<T> {
    fn shape(&self, text: &str, font: &Font) -> Result<ShapedRun, LayoutError> {
        (**self).shape(text, font)
    }
}

impl<T: Shaper + ?Sized> Shaper for &T {
    fn shape(&self, text: &str, font: &Font) -> Result<ShapedRun, LayoutError> {
        (**self).shape(text, font)
    }
}
