// Copyright 2017 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/*!
`paintkit` is a small graphics toolkit for painting applications.

It turns styled text into glyph outline paths and provides CPU
image-processing contexts to rasterize and filter them.

## Main types

- [`Utility`] - Text to path conversions and the context factory
- [`Context`] - An image-processing context
- [`ContextOptions`] - Context configuration

## Re-exports

This crate re-exports [`tiny_skia`] for pixmap handling and [`glyphpath`] for text layout.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]

pub use glyphpath;
pub use tiny_skia;

mod context;
mod encode;
mod options;
mod path;

use std::sync::Arc;

use glyphpath::{AttributedString, Error, GlyphPath, Shaper};

pub use context::{Context, Filter, Image, ImageError, Stats, INTERMEDIATE_CACHE_CAPACITY};
pub use options::{ColorSpace, ConfigError, ContextOptions, OptionValue, PixelFormat};
pub use path::{Fill, FillRule, Stroke};

/// Graphics and text utilities.
///
/// Every conversion is a pure function of its arguments and the shaper,
/// so a single `Utility` can be shared between threads.
#[derive(Clone)]
pub struct Utility {
    shaper: Arc<dyn Shaper>,
}

impl std::fmt::Debug for Utility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utility").finish_non_exhaustive()
    }
}

#[cfg(feature = "system-fonts")]
impl Default for Utility {
    fn default() -> Self {
        Self::with_system_fonts()
    }
}

impl Utility {
    /// Creates a utility backed by a custom shaper.
    pub fn new(shaper: Arc<dyn Shaper>) -> Self {
        Utility { shaper }
    }

    /// Creates a utility shaping text with fonts from `fontdb`.
    #[cfg(feature = "text")]
    pub fn with_fontdb(fontdb: Arc<glyphpath::fontdb::Database>) -> Self {
        Self::new(Arc::new(glyphpath::FontdbShaper::new(fontdb)))
    }

    /// Creates a utility shaping text with system fonts.
    #[cfg(feature = "system-fonts")]
    pub fn with_system_fonts() -> Self {
        Self::new(Arc::new(glyphpath::FontdbShaper::with_system_fonts()))
    }

    /// Returns the shaper.
    pub fn shaper(&self) -> &Arc<dyn Shaper> {
        &self.shaper
    }

    /// Creates a new image-processing context.
    ///
    /// Each call returns an independent context, even for identical options.
    pub fn image_context(options: ContextOptions) -> Result<Context, ConfigError> {
        Context::new(options)
    }

    /// Lays `text` out inside `rect` and returns its glyph outlines.
    ///
    /// Lines wrap at the rect width. Lines that do not fit its height are dropped.
    pub fn path_in_rect(
        &self,
        text: &AttributedString,
        rect: glyphpath::Rect,
    ) -> Result<GlyphPath, Error> {
        glyphpath::path_in_rect(text, rect, self.shaper.as_ref())
    }

    /// Returns outlines of a single line of unstyled text.
    pub fn single_line_path(&self, text: &str, font_size: f32) -> Result<GlyphPath, Error> {
        glyphpath::single_line_path(text, font_size, self.shaper.as_ref())
    }

    /// Returns outlines of `text` laid out at its natural size.
    pub fn path(&self, text: &AttributedString) -> Result<GlyphPath, Error> {
        glyphpath::path(text, self.shaper.as_ref())
    }

    /// Returns outlines of `text` that never exceed `max_size`.
    pub fn path_with_max_size(
        &self,
        text: &AttributedString,
        max_size: glyphpath::Size,
    ) -> Result<GlyphPath, Error> {
        glyphpath::path_with_max_size(text, max_size, self.shaper.as_ref())
    }
}
