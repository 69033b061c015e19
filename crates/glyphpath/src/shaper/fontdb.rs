// Copyright 2022 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use fontdb::{Database, Family, Query, Stretch, Style, Weight, ID};
use skrifa::{
    instance::{LocationRef, Size as SkrifaSize},
    outline::{DrawSettings, OutlinePen},
    FontRef, GlyphId, MetadataProvider,
};
use tiny_skia_path::Transform;
use unicode_script::{Script, UnicodeScript};

use super::metrics::{self, FaceMetrics};
use super::{LineMetrics, ShapedGlyph, ShapedRun, Shaper};
use crate::{Font, FontStyle, LayoutError, OptionLog};

type OutlineCache = HashMap<(ID, u32), Option<Arc<tiny_skia_path::Path>>>;

/// A shaper backed by a font database.
///
/// Faces are matched with CSS-like queries, text is shaped with harfrust
/// and outlines are extracted with skrifa. Characters missing from the
/// matched face are taken from any other face in the database that has
/// them.
///
/// Outlines are cached per face and glyph, so sharing one shaper between
/// conversions is cheaper than creating a new one each time.
pub struct FontdbShaper {
    fontdb: Arc<Database>,
    outlines: Mutex<OutlineCache>,
}

impl std::fmt::Debug for FontdbShaper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontdbShaper")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl FontdbShaper {
    /// Creates a shaper over an existing database.
    pub fn new(fontdb: Arc<Database>) -> Self {
        FontdbShaper {
            fontdb,
            outlines: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a shaper over all system fonts.
    #[cfg(feature = "system-fonts")]
    pub fn with_system_fonts() -> Self {
        let mut fontdb = Database::new();
        fontdb.load_system_fonts();
        log::debug!("Loaded {} system font faces.", fontdb.len());
        Self::new(Arc::new(fontdb))
    }

    /// Returns the underlying database.
    #[inline]
    pub fn fontdb(&self) -> &Arc<Database> {
        &self.fontdb
    }

    fn resolve(&self, font: &Font) -> Result<ID, LayoutError> {
        let families: Vec<Family> = font.families.iter().map(|name| to_family(name)).collect();
        let style = match font.style {
            FontStyle::Normal => Style::Normal,
            FontStyle::Italic => Style::Italic,
            FontStyle::Oblique => Style::Oblique,
        };

        let mut query = Query {
            families: &families,
            weight: Weight(font.weight),
            stretch: Stretch::Normal,
            style,
        };

        if let Some(id) = self.fontdb.query(&query) {
            return Ok(id);
        }

        query.families = &[Family::SansSerif];
        if let Some(id) = self.fontdb.query(&query) {
            return Ok(id);
        }

        // Generic families may point to fonts that are not installed.
        // Settle for any face of the same style, then any face at all.
        self.fontdb
            .faces()
            .find(|face| face.style == style)
            .or_else(|| self.fontdb.faces().next())
            .map(|face| {
                log::warn!(
                    "No match for {:?} font-family. Using {}.",
                    font.families,
                    face.post_script_name
                );
                face.id
            })
            .log_none(|| log::warn!("Font database is empty."))
            .ok_or_else(|| LayoutError::NoFont {
                families: font.families.clone(),
            })
    }

    /// Finds a face other than `base` that has a glyph for `c`.
    fn fallback(&self, base: ID, c: char) -> Option<ID> {
        let base_face = self.fontdb.face(base)?;

        let covers = |id: ID| {
            self.fontdb
                .with_face_data(id, |data, index| metrics::has_char(data, index, c))
                .unwrap_or(false)
        };

        // Prefer a face of the same style and weight, then anything.
        let same_style = self.fontdb.faces().find(|face| {
            face.id != base
                && face.style == base_face.style
                && face.weight == base_face.weight
                && covers(face.id)
        });

        let face = match same_style {
            Some(face) => face,
            None => self.fontdb.faces().find(|face| face.id != base && covers(face.id))?,
        };

        log::debug!(
            "Fallback from {} to {} for {:?}.",
            base_face.post_script_name,
            face.post_script_name,
            c
        );

        Some(face.id)
    }

    /// Splits text into runs of a single face and script.
    fn itemize(&self, text: &str, primary: ID) -> Result<Vec<Item>, LayoutError> {
        let coverage = self
            .fontdb
            .with_face_data(primary, |data, index| {
                let font = FontRef::from_index(data, index).ok()?;
                let charmap = font.charmap();
                Some(text.chars().map(|c| charmap.map(c).is_some()).collect::<Vec<_>>())
            })
            .flatten()
            .ok_or_else(|| LayoutError::MalformedFont(self.face_name(primary)))?;

        let mut fallbacks: HashMap<char, ID> = HashMap::new();
        let mut items: Vec<Item> = Vec::new();

        for ((offset, c), covered) in text.char_indices().zip(coverage) {
            let neutral = c.is_whitespace() || c.is_control();

            let face = if covered || neutral {
                items.last().filter(|_| neutral).map_or(primary, |item| item.face)
            } else if let Some(id) = fallbacks.get(&c) {
                *id
            } else {
                let id = self
                    .fallback(primary, c)
                    .ok_or(LayoutError::MissingGlyph { ch: c, offset })?;
                fallbacks.insert(c, id);
                id
            };

            let script = c.script();
            let end = offset + c.len_utf8();

            match items.last_mut() {
                Some(item) if item.face == face && item.accepts(script) => {
                    item.range.end = end;
                    if item.script == Script::Common && !is_neutral_script(script) {
                        item.script = script;
                    }
                }
                _ => items.push(Item {
                    range: offset..end,
                    face,
                    script: if is_neutral_script(script) { Script::Common } else { script },
                }),
            }
        }

        Ok(items)
    }

    fn face_metrics(&self, id: ID) -> Result<FaceMetrics, LayoutError> {
        self.fontdb
            .with_face_data(id, |data, index| {
                let font = FontRef::from_index(data, index).ok()?;
                metrics::load_face_metrics(&font)
            })
            .flatten()
            .ok_or_else(|| LayoutError::MalformedFont(self.face_name(id)))
    }

    fn shape_item(
        &self,
        text: &str,
        item: &Item,
        font_size: f32,
        glyphs: &mut Vec<ShapedGlyph>,
    ) -> Result<LineMetrics, LayoutError> {
        let face_metrics = self.face_metrics(item.face)?;
        let scale = face_metrics.scale(font_size);
        let outline_ts = Transform::from_scale(scale, -scale);

        let shaped = self
            .fontdb
            .with_face_data(item.face, |data, index| {
                let font = harfrust::FontRef::from_index(data, index).ok()?;
                let shaper_data = harfrust::ShaperData::new(&font);
                let shaper = shaper_data.shaper(&font).build();

                let mut buffer = harfrust::UnicodeBuffer::new();
                buffer.push_str(&text[item.range.clone()]);
                buffer.guess_segment_properties();

                let output = shaper.shape(buffer, &[]);
                let shaped: Vec<_> = output
                    .glyph_infos()
                    .iter()
                    .zip(output.glyph_positions())
                    .map(|(info, pos)| {
                        (
                            info.glyph_id,
                            info.cluster as usize,
                            pos.x_advance,
                            pos.x_offset,
                            pos.y_offset,
                        )
                    })
                    .collect();
                Some(shaped)
            })
            .flatten()
            .ok_or_else(|| LayoutError::MalformedFont(self.face_name(item.face)))?;

        for (glyph_id, cluster, x_advance, x_offset, y_offset) in shaped {
            let outline = self
                .outline(item.face, glyph_id)
                .and_then(|path| path.as_ref().clone().transform(outline_ts))
                .map(Arc::new);

            glyphs.push(ShapedGlyph {
                cluster: item.range.start + cluster,
                advance: x_advance as f32 * scale,
                x_offset: x_offset as f32 * scale,
                y_offset: -(y_offset as f32) * scale,
                outline,
            });
        }

        Ok(face_metrics.to_line_metrics(font_size))
    }

    /// Returns a glyph outline in font units, y-up.
    fn outline(&self, id: ID, glyph_id: u32) -> Option<Arc<tiny_skia_path::Path>> {
        let mut cache = self.outlines.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(path) = cache.get(&(id, glyph_id)) {
            return path.clone();
        }

        let path = self
            .fontdb
            .with_face_data(id, |data, face_index| -> Option<tiny_skia_path::Path> {
                let font = FontRef::from_index(data, face_index).ok()?;
                let outlines = font.outline_glyphs();
                let glyph = outlines.get(GlyphId::new(glyph_id))?;

                let mut pen = SkrifaPen::new();
                let settings =
                    DrawSettings::unhinted(SkrifaSize::unscaled(), LocationRef::default());
                glyph.draw(settings, &mut pen).ok()?;
                pen.finish()
            })
            .flatten()
            .map(Arc::new);

        cache.insert((id, glyph_id), path.clone());
        path
    }

    fn face_name(&self, id: ID) -> String {
        self.fontdb
            .face(id)
            .map(|face| face.post_script_name.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

impl Shaper for FontdbShaper {
    fn shape(&self, text: &str, font: &Font) -> Result<ShapedRun, LayoutError> {
        let primary = self.resolve(font)?;
        let mut metrics = self.face_metrics(primary)?.to_line_metrics(font.size);

        let mut glyphs = Vec::with_capacity(text.len());
        for item in self.itemize(text, primary)? {
            let item_metrics = self.shape_item(text, &item, font.size, &mut glyphs)?;
            metrics = metrics.max(item_metrics);
        }

        Ok(ShapedRun { glyphs, metrics })
    }
}

/// A run of text shaped with a single face.
struct Item {
    range: Range<usize>,
    face: ID,
    script: Script,
}

impl Item {
    fn accepts(&self, script: Script) -> bool {
        is_neutral_script(script) || self.script == Script::Common || self.script == script
    }
}

fn is_neutral_script(script: Script) -> bool {
    matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

fn to_family(name: &str) -> Family<'_> {
    match name {
        "serif" => Family::Serif,
        "sans-serif" => Family::SansSerif,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        "monospace" => Family::Monospace,
        _ => Family::Name(name),
    }
}

/// Pen adapter for skrifa's OutlinePen trait -> tiny_skia_path::PathBuilder
struct SkrifaPen {
    builder: tiny_skia_path::PathBuilder,
}

impl SkrifaPen {
    fn new() -> Self {
        Self {
            builder: tiny_skia_path::PathBuilder::new(),
        }
    }

    fn finish(self) -> Option<tiny_skia_path::Path> {
        self.builder.finish()
    }
}

impl OutlinePen for SkrifaPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.builder.quad_to(cx0, cy0, x, y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.builder.cubic_to(cx0, cy0, cx1, cy1, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_families() {
        assert_eq!(to_family("serif"), Family::Serif);
        assert_eq!(to_family("monospace"), Family::Monospace);
        assert_eq!(to_family("Noto Sans"), Family::Name("Noto Sans"));
    }

    #[test]
    fn empty_database_has_no_font() {
        let shaper = FontdbShaper::new(Arc::new(Database::new()));
        let err = shaper.shape("A", &Font::default()).unwrap_err();
        assert!(matches!(err, LayoutError::NoFont { .. }));
    }

    #[test]
    fn pen_closes_contours() {
        let mut pen = SkrifaPen::new();
        pen.move_to(0.0, 0.0);
        pen.line_to(10.0, 0.0);
        pen.quad_to(10.0, 10.0, 0.0, 10.0);
        pen.close();

        let path = pen.finish().unwrap();
        assert_eq!(path.bounds().width(), 10.0);
        assert_eq!(path.len(), 4);
    }
}
