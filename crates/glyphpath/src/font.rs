// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::Error;

/// A font style.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum FontStyle {
    /// A face that is neither italic not obliqued.
    #[default]
    Normal,
    /// A form that is generally cursive in nature.
    Italic,
    /// A typically-sloped version of the regular face.
    Oblique,
}

/// A font request.
///
/// Families are tried in order. Generic names (`serif`, `sans-serif`,
/// `monospace`, `cursive`, `fantasy`) are resolved by the shaper.
#[derive(Clone, PartialEq, Debug)]
pub struct Font {
    /// Ordered list of family names.
    pub families: Vec<String>,
    /// Font size in pixels.
    pub size: f32,
    /// Weight in the CSS sense, 400 is regular.
    pub weight: u16,
    /// Font style.
    pub style: FontStyle,
}

impl Default for Font {
    fn default() -> Self {
        Font {
            families: vec!["sans-serif".to_string()],
            size: 12.0,
            weight: 400,
            style: FontStyle::Normal,
        }
    }
}

impl Font {
    /// Creates a regular sans-serif font of the given size.
    pub fn with_size(size: f32) -> Self {
        Font {
            size,
            ..Font::default()
        }
    }

    /// Creates a regular font of the given family and size.
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Font {
            families: vec![family.into()],
            size,
            ..Font::default()
        }
    }

    /// Returns a copy with a different weight.
    pub fn weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    /// Returns a copy with a different style.
    pub fn style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(Error::invalid(
                "font size",
                format!("must be positive and finite, got {}", self.size),
            ));
        }

        if !(1..=1000).contains(&self.weight) {
            return Err(Error::invalid(
                "font weight",
                format!("must be in 1..=1000, got {}", self.weight),
            ));
        }

        Ok(())
    }
}
