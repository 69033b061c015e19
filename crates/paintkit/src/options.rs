// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::str::FromStr;

use thiserror::Error;

/// An image-processing context configuration error.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The key is not a known option.
    #[error("unknown option `{0}`")]
    UnknownKey(String),

    /// The value has the wrong type or is out of range.
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue {
        /// Option name.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The same option was given twice, possibly under an alias.
    #[error("option `{0}` is set more than once")]
    Duplicate(&'static str),

    /// The option value is valid but cannot be honoured.
    #[error("unsupported `{key}`: {reason}")]
    Unsupported {
        /// Option name.
        key: &'static str,
        /// Why it is not supported.
        reason: &'static str,
    },

    /// Two options cannot be combined.
    #[error("`{first}` conflicts with `{second}`: {reason}")]
    Conflict {
        #[allow(missing_docs)]
        first: &'static str,
        #[allow(missing_docs)]
        second: &'static str,
        /// Why they conflict.
        reason: &'static str,
    },
}

/// A color space.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ColorSpace {
    /// sRGB with the sRGB transfer function.
    Srgb,
    /// sRGB primaries with a linear transfer function.
    LinearSrgb,
    /// Display P3.
    DisplayP3,
}

impl FromStr for ColorSpace {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "srgb" => Ok(ColorSpace::Srgb),
            "linear-srgb" => Ok(ColorSpace::LinearSrgb),
            "display-p3" => Ok(ColorSpace::DisplayP3),
            _ => Err(()),
        }
    }
}

/// A working pixel format.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PixelFormat {
    /// 8 bits per channel, premultiplied.
    Rgba8,
    /// 32-bit float per channel.
    Rgbaf,
}

impl FromStr for PixelFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "rgba8" => Ok(PixelFormat::Rgba8),
            "rgbaf" => Ok(PixelFormat::Rgbaf),
            _ => Err(()),
        }
    }
}

/// An untyped option value, as found in configuration dictionaries.
#[derive(Clone, PartialEq, Debug)]
#[allow(missing_docs)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<bool> for OptionValue {
    fn from(v: bool) -> Self {
        OptionValue::Bool(v)
    }
}

impl From<f64> for OptionValue {
    fn from(v: f64) -> Self {
        OptionValue::Number(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        OptionValue::String(v.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        OptionValue::String(v)
    }
}

/// Image-processing context options.
///
/// `None` means "use the default". Options are validated when a context is
/// created, see [`Context::new`](crate::Context::new).
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ContextOptions {
    /// Color space filters operate in. Default: sRGB.
    pub working_color_space: Option<ColorSpace>,
    /// Color space of [`Context::output_bytes`](crate::Context::output_bytes). Default: sRGB.
    pub output_color_space: Option<ColorSpace>,
    /// Pixel format filters operate on. Default: RGBA8.
    pub working_format: Option<PixelFormat>,
    /// Render on the CPU. Default: true, which is the only supported value.
    pub use_software_renderer: Option<bool>,
    /// Use bicubic instead of nearest filtering when downsampling. Default: false.
    pub high_quality_downsample: Option<bool>,
    /// Keep output pixels premultiplied. Default: true.
    pub output_premultiplied: Option<bool>,
    /// Memoize filter results inside the context. Default: false.
    pub cache_intermediates: Option<bool>,
    /// Context name used in log messages.
    pub name: Option<String>,
}

impl ContextOptions {
    /// Converts a string-keyed option list into typed options.
    ///
    /// Keys are the field names of this struct. CoreImage-style names
    /// (`kCIContextWorkingColorSpace` and friends) are accepted as aliases.
    /// Color spaces are `srgb`, `linear-srgb` or `display-p3`, formats are
    /// `rgba8` or `rgbaf`.
    ///
    /// The result is not validated yet.
    pub fn from_pairs<'a, I, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<OptionValue>,
    {
        let mut opt = ContextOptions::default();

        for (key, value) in pairs {
            let value = value.into();
            match key {
                "working_color_space" | "kCIContextWorkingColorSpace" => {
                    let key = "working_color_space";
                    set_once(&mut opt.working_color_space, key, parse_str(key, &value)?)?
                }
                "output_color_space" | "kCIContextOutputColorSpace" => {
                    let key = "output_color_space";
                    set_once(&mut opt.output_color_space, key, parse_str(key, &value)?)?
                }
                "working_format" | "kCIContextWorkingFormat" => {
                    let key = "working_format";
                    set_once(&mut opt.working_format, key, parse_str(key, &value)?)?
                }
                "use_software_renderer" | "kCIContextUseSoftwareRenderer" => {
                    let key = "use_software_renderer";
                    set_once(&mut opt.use_software_renderer, key, parse_bool(key, &value)?)?
                }
                "high_quality_downsample" | "kCIContextHighQualityDownsample" => {
                    let key = "high_quality_downsample";
                    set_once(&mut opt.high_quality_downsample, key, parse_bool(key, &value)?)?
                }
                "output_premultiplied" | "kCIContextOutputPremultiplied" => {
                    let key = "output_premultiplied";
                    set_once(&mut opt.output_premultiplied, key, parse_bool(key, &value)?)?
                }
                "cache_intermediates" | "kCIContextCacheIntermediates" => {
                    let key = "cache_intermediates";
                    set_once(&mut opt.cache_intermediates, key, parse_bool(key, &value)?)?
                }
                "name" | "kCIContextName" => match value {
                    OptionValue::String(s) => set_once(&mut opt.name, "name", s)?,
                    _ => return Err(wrong_type("name", "a string")),
                },
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            }
        }

        Ok(opt)
    }

    /// Checks that the options can be honoured together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.use_software_renderer == Some(false) {
            return Err(ConfigError::Unsupported {
                key: "use_software_renderer",
                reason: "only CPU rendering is available",
            });
        }

        if self.working_format == Some(PixelFormat::Rgbaf) {
            return Err(ConfigError::Unsupported {
                key: "working_format",
                reason: "pixels are processed as 8-bit premultiplied RGBA",
            });
        }

        match self.working_color_space {
            Some(ColorSpace::LinearSrgb) if self.working_format == Some(PixelFormat::Rgba8) => {
                return Err(ConfigError::Conflict {
                    first: "working_color_space",
                    second: "working_format",
                    reason: "linear light needs more than 8 bits per channel",
                });
            }
            Some(ColorSpace::LinearSrgb) | Some(ColorSpace::DisplayP3) => {
                return Err(ConfigError::Unsupported {
                    key: "working_color_space",
                    reason: "filters operate in sRGB only",
                });
            }
            _ => {}
        }

        if self.output_color_space == Some(ColorSpace::DisplayP3) {
            return Err(ConfigError::Unsupported {
                key: "output_color_space",
                reason: "only sRGB and linear sRGB output is available",
            });
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "name",
                    reason: "must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn set_once<T>(slot: &mut Option<T>, key: &'static str, value: T) -> Result<(), ConfigError> {
    if slot.is_some() {
        return Err(ConfigError::Duplicate(key));
    }

    *slot = Some(value);
    Ok(())
}

fn wrong_type(key: &'static str, expected: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: format!("expected {}", expected),
    }
}

fn parse_bool(key: &'static str, value: &OptionValue) -> Result<bool, ConfigError> {
    match value {
        OptionValue::Bool(b) => Ok(*b),
        // Foreign option dictionaries often store booleans as 0 and 1.
        OptionValue::Number(n) if *n == 0.0 || *n == 1.0 => Ok(*n == 1.0),
        _ => Err(wrong_type(key, "a boolean")),
    }
}

fn parse_str<T: FromStr>(key: &'static str, value: &OptionValue) -> Result<T, ConfigError> {
    match value {
        OptionValue::String(s) => s.parse().map_err(|_| ConfigError::InvalidValue {
            key,
            reason: format!("unknown value `{}`", s),
        }),
        _ => Err(wrong_type(key, "a string")),
    }
}
