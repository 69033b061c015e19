// Copyright 2024 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font metrics extraction using skrifa.

use std::num::NonZeroU16;

use skrifa::{instance::LocationRef, instance::Size as SkrifaSize, FontRef, MetadataProvider};

use super::LineMetrics;

/// Vertical metrics of a face, in font units.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FaceMetrics {
    pub units_per_em: NonZeroU16,
    pub ascent: f32,
    /// Positive, unlike the font tables.
    pub descent: f32,
    pub line_gap: f32,
}

impl FaceMetrics {
    /// Font units to pixels factor.
    #[inline]
    pub fn scale(&self, font_size: f32) -> f32 {
        font_size / f32::from(self.units_per_em.get())
    }

    pub fn to_line_metrics(self, font_size: f32) -> LineMetrics {
        let scale = self.scale(font_size);
        LineMetrics {
            ascent: self.ascent * scale,
            descent: self.descent * scale,
            line_gap: self.line_gap.max(0.0) * scale,
        }
    }
}

/// Load face metrics using skrifa's MetadataProvider.
pub(crate) fn load_face_metrics(font: &FontRef) -> Option<FaceMetrics> {
    let metrics = font.metrics(SkrifaSize::unscaled(), LocationRef::default());
    let units_per_em = NonZeroU16::new(metrics.units_per_em)?;

    let mut ascent = metrics.ascent;
    let mut descent = -metrics.descent;
    if ascent <= 0.0 && descent <= 0.0 {
        // Broken hhea/OS/2 tables. 0.8/0.2 is what most fonts ship with.
        let upem = f32::from(units_per_em.get());
        ascent = upem * 0.8;
        descent = upem * 0.2;
    }

    Some(FaceMetrics {
        units_per_em,
        ascent,
        descent,
        line_gap: metrics.leading,
    })
}

/// Check if a font contains a glyph for the given character using skrifa's charmap.
pub(crate) fn has_char(data: &[u8], face_index: u32, c: char) -> bool {
    let font = match FontRef::from_index(data, face_index) {
        Ok(f) => f,
        Err(_) => return false,
    };

    font.charmap().map(c).is_some()
}
