// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/*!
`glyphpath` converts styled text into glyph outline paths.

Text is described by an [`AttributedString`], laid out into lines by
[`layout`] using a pluggable [`Shaper`] and finally assembled into a single
[`GlyphPath`] made of closed contours.

## Main functions

- [`path_in_rect`] - Lays text out inside a rectangle
- [`path`] - Lays text out at its natural size
- [`path_with_max_size`] - Lays text out, never exceeding a maximum size
- [`single_line_path`] - Lays out a single line of unstyled text

The fontdb-backed shaper ([`FontdbShaper`]) requires the `fonts` feature.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]

mod error;
mod font;
pub mod layout;
mod outline;
pub mod shaper;
mod text;

pub use error::{Error, LayoutError};
pub use font::{Font, FontStyle};
pub use outline::{path, path_in_rect, path_with_max_size, single_line_path, GlyphPath};
#[cfg(feature = "fonts")]
pub use shaper::FontdbShaper;
pub use shaper::{BoxShaper, LineMetrics, ShapedGlyph, ShapedRun, Shaper};
pub use text::{
    Alignment, AttributeRun, AttributedString, Attributes, Color, LineBreak, ParagraphStyle,
};

#[cfg(feature = "fonts")]
pub use fontdb;
pub use tiny_skia_path;
pub use tiny_skia_path::{NonZeroRect, Rect, Size, Transform};

/// Tolerance used when comparing layout widths and heights.
pub(crate) const LAYOUT_EPSILON: f32 = 1e-3;

pub(crate) trait OptionLog {
    fn log_none<F: FnOnce()>(self, f: F) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn log_none<F: FnOnce()>(self, f: F) -> Self {
        self.or_else(|| {
            f();
            None
        })
    }
}
