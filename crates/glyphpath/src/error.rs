// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// A text to path conversion error.
#[derive(Debug, Error)]
pub enum Error {
    /// A numeric or geometric parameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The text could not be shaped.
    #[error("text layout failed: {0}")]
    Layout(#[from] LayoutError),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// A shaping failure reported by a [`Shaper`](crate::Shaper).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum LayoutError {
    /// No font face matches the requested families, not even a fallback.
    #[error("no font matches families {families:?}")]
    NoFont {
        /// Requested family list.
        families: Vec<String>,
    },

    /// No available font face has a glyph for a character.
    #[error("no glyph for {ch:?} at byte {offset}")]
    MissingGlyph {
        /// The character.
        ch: char,
        /// Byte offset of the character in the shaped text.
        offset: usize,
    },

    /// Font data could not be parsed.
    #[error("malformed font: {0}")]
    MalformedFont(String),
}
