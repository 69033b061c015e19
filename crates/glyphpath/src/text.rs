// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::ops::Range;
use std::str::FromStr;

use crate::{Error, Font};

/// An 8-bit RGBA color.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[allow(missing_docs)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    /// Constructs a new color.
    #[inline]
    pub const fn new_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Color {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Opaque black.
    #[inline]
    pub const fn black() -> Self {
        Self::new_rgba(0, 0, 0, 255)
    }

    /// Opaque white.
    #[inline]
    pub const fn white() -> Self {
        Self::new_rgba(255, 255, 255, 255)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::black()
    }
}

impl FromStr for Color {
    type Err = svgtypes::Error;

    /// Parses any CSS color: `#rgb`, `#rrggbb`, `rgb()`, `hsl()` or a named color.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let c = svgtypes::Color::from_str(text)?;
        Ok(Color::new_rgba(c.red, c.green, c.blue, c.alpha))
    }
}

/// Horizontal alignment of the lines of a paragraph.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Alignment {
    /// Left-to-right text is left aligned.
    #[default]
    Natural,
    #[allow(missing_docs)]
    Left,
    #[allow(missing_docs)]
    Center,
    #[allow(missing_docs)]
    Right,
}

/// How lines are broken when the text does not fit the layout width.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LineBreak {
    /// Break after whitespace, falling back to characters for long words.
    #[default]
    WordWrap,
    /// Break before the first character that does not fit.
    CharWrap,
}

/// Paragraph level attributes.
///
/// Only the attributes at the start of a paragraph are taken into account.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct ParagraphStyle {
    /// Line alignment.
    pub alignment: Alignment,
    /// Extra space between lines, in pixels.
    pub line_spacing: f32,
    /// Line breaking mode.
    pub line_break: LineBreak,
}

/// Attributes applied to a range of text.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Attributes {
    /// Font request.
    pub font: Font,
    /// Foreground color.
    pub color: Color,
    /// Extra advance added after every character, in pixels.
    pub kern: f32,
    /// Paragraph attributes.
    pub paragraph: ParagraphStyle,
}

impl Attributes {
    /// Creates default attributes with a specific font.
    pub fn with_font(font: Font) -> Self {
        Attributes {
            font,
            ..Attributes::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.font.validate()?;

        if !self.kern.is_finite() {
            return Err(Error::invalid("kern", "must be finite"));
        }

        let spacing = self.paragraph.line_spacing;
        if !spacing.is_finite() || spacing < 0.0 {
            return Err(Error::invalid(
                "line spacing",
                format!("must be non-negative and finite, got {}", spacing),
            ));
        }

        Ok(())
    }
}

/// A contiguous range of text sharing the same attributes.
#[derive(Clone, PartialEq, Debug)]
pub struct AttributeRun {
    /// Byte range in the parent string.
    pub range: Range<usize>,
    /// Attributes of the range.
    pub attributes: Attributes,
}

/// Text with per-range attributes.
///
/// Attribute runs always cover the whole string without gaps and start on
/// char boundaries. An empty string keeps a single empty run holding the
/// attributes new text would get.
#[derive(Clone, PartialEq, Debug)]
pub struct AttributedString {
    text: String,
    runs: Vec<AttributeRun>,
}

impl Default for AttributedString {
    fn default() -> Self {
        AttributedString::new("", Attributes::default())
    }
}

impl From<&str> for AttributedString {
    fn from(text: &str) -> Self {
        AttributedString::new(text, Attributes::default())
    }
}

impl AttributedString {
    /// Creates a string with a single attribute run.
    pub fn new(text: impl Into<String>, attributes: Attributes) -> Self {
        let text = text.into();
        let runs = vec![AttributeRun {
            range: 0..text.len(),
            attributes,
        }];

        AttributedString { text, runs }
    }

    /// Appends text with its own attributes.
    pub fn push_str(&mut self, text: &str, attributes: Attributes) {
        if self.text.is_empty() {
            self.text.push_str(text);
            self.runs = vec![AttributeRun {
                range: 0..self.text.len(),
                attributes,
            }];
            return;
        }

        if text.is_empty() {
            return;
        }

        let start = self.text.len();
        self.text.push_str(text);
        let end = self.text.len();

        match self.runs.last_mut() {
            Some(last) if last.attributes == attributes => last.range.end = end,
            _ => self.runs.push(AttributeRun {
                range: start..end,
                attributes,
            }),
        }
    }

    /// Replaces the attributes of a byte range.
    ///
    /// The range must lie inside the string and on char boundaries.
    pub fn set_attributes(
        &mut self,
        range: Range<usize>,
        attributes: Attributes,
    ) -> Result<(), Error> {
        if range.start > range.end
            || range.end > self.text.len()
            || !self.text.is_char_boundary(range.start)
            || !self.text.is_char_boundary(range.end)
        {
            return Err(Error::invalid(
                "range",
                format!("{:?} is not a char range of a {} byte string", range, self.text.len()),
            ));
        }

        if range.is_empty() {
            return Ok(());
        }

        let mut pieces = Vec::with_capacity(self.runs.len() + 2);
        for run in self.runs.drain(..) {
            let before = run.range.start..run.range.end.min(range.start);
            if !before.is_empty() {
                pieces.push(AttributeRun {
                    range: before,
                    attributes: run.attributes.clone(),
                });
            }

            let after = run.range.start.max(range.end)..run.range.end;
            if !after.is_empty() {
                pieces.push(AttributeRun {
                    range: after,
                    attributes: run.attributes,
                });
            }
        }

        pieces.push(AttributeRun { range, attributes });
        pieces.sort_by_key(|run| run.range.start);

        for run in pieces {
            match self.runs.last_mut() {
                Some(last) if last.attributes == run.attributes => last.range.end = run.range.end,
                _ => self.runs.push(run),
            }
        }

        Ok(())
    }

    /// Returns the plain text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the text length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Checks that the text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns attribute runs in text order.
    #[inline]
    pub fn runs(&self) -> &[AttributeRun] {
        &self.runs
    }

    /// Returns attributes at a byte offset.
    ///
    /// Offsets past the end return the attributes of the last run.
    pub fn attributes_at(&self, index: usize) -> &Attributes {
        let run = self
            .runs
            .iter()
            .find(|run| run.range.contains(&index))
            .unwrap_or(&self.runs[self.runs.len() - 1]);
        &run.attributes
    }

    /// Splits a byte range into sub-ranges with uniform attributes.
    pub(crate) fn pieces(
        &self,
        range: Range<usize>,
    ) -> impl Iterator<Item = (Range<usize>, &Attributes)> + '_ {
        self.runs.iter().filter_map(move |run| {
            let start = run.range.start.max(range.start);
            let end = run.range.end.min(range.end);
            (start < end).then_some((start..end, &run.attributes))
        })
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        self.runs.iter().try_for_each(|run| run.attributes.validate())
    }
}
