// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use tiny_skia_path::{PathBuilder, Rect};

use super::{LineMetrics, ShapedGlyph, ShapedRun, Shaper};
use crate::{Font, LayoutError};

/// Advance of every character, in ems.
const ADVANCE: f32 = 0.6;
/// Glyph box placement, in ems.
const BOX_LEFT: f32 = 0.05;
const BOX_WIDTH: f32 = 0.5;
const BOX_HEIGHT: f32 = 0.7;
const ASCENT: f32 = 0.8;
const DESCENT: f32 = 0.2;

/// A deterministic shaper that draws every character as a box.
///
/// Each character is its own cluster and advances by `0.6em`. Visible
/// characters draw a `0.5em x 0.7em` box standing on the baseline,
/// whitespace draws nothing. Characters from the Private Use Area have no
/// glyph and fail with [`LayoutError::MissingGlyph`].
///
/// Useful for tests and for measuring layout without fonts.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoxShaper;

impl BoxShaper {
    fn glyph_box(size: f32) -> Option<Arc<tiny_skia_path::Path>> {
        let rect = Rect::from_xywh(
            BOX_LEFT * size,
            -BOX_HEIGHT * size,
            BOX_WIDTH * size,
            BOX_HEIGHT * size,
        )?;
        Some(Arc::new(PathBuilder::from_rect(rect)))
    }
}

fn is_private_use(c: char) -> bool {
    matches!(c as u32, 0xE000..=0xF8FF | 0xF0000..=0xFFFFD | 0x100000..=0x10FFFD)
}

impl Shaper for BoxShaper {
    fn shape(&self, text: &str, font: &Font) -> Result<ShapedRun, LayoutError> {
        let size = font.size;
        let outline = Self::glyph_box(size);

        let mut glyphs = Vec::with_capacity(text.len());
        for (offset, ch) in text.char_indices() {
            if is_private_use(ch) {
                return Err(LayoutError::MissingGlyph { ch, offset });
            }

            let visible = !ch.is_whitespace() && !ch.is_control();
            glyphs.push(ShapedGlyph {
                cluster: offset,
                advance: ADVANCE * size,
                x_offset: 0.0,
                y_offset: 0.0,
                outline: if visible { outline.clone() } else { None },
            });
        }

        Ok(ShapedRun {
            glyphs,
            metrics: LineMetrics {
                ascent: ASCENT * size,
                descent: DESCENT * size,
                line_gap: 0.0,
            },
        })
    }
}
