// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};

use glyphpath::{Color, GlyphPath};
use lru::LruCache;
use rgb::FromSlice;
use thiserror::Error;

use crate::encode;
use crate::options::{ColorSpace, ConfigError, ContextOptions};
use crate::path::{self, Fill, Stroke};

/// An image operation error.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Zero or too large image dimensions.
    #[error("invalid image size {width}x{height}")]
    InvalidSize {
        #[allow(missing_docs)]
        width: u32,
        #[allow(missing_docs)]
        height: u32,
    },

    /// A filter parameter is out of range.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A path without area cannot be filled.
    #[error("path has no area")]
    EmptyPath,

    /// A stroke width must be positive and finite.
    #[error("invalid stroke width {0}")]
    InvalidStroke(f32),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),
}

// Image ids are unique across contexts, so an image processed by a context
// other than the one that created it never hits a stale cache entry.
static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

fn next_image_id() -> u64 {
    NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A raster image.
///
/// Pixels are premultiplied RGBA8 in sRGB.
#[derive(Clone)]
pub struct Image {
    id: u64,
    pixmap: tiny_skia::Pixmap,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl Image {
    fn new(pixmap: tiny_skia::Pixmap) -> Self {
        Image {
            id: next_image_id(),
            pixmap,
        }
    }

    /// Returns a unique image id. Changes on every modification.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Returns the underlying pixmap.
    #[inline]
    pub fn pixmap(&self) -> &tiny_skia::Pixmap {
        &self.pixmap
    }

    /// Returns a premultiplied pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<tiny_skia::PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }

    fn touch(&mut self) {
        self.id = next_image_id();
    }
}

/// An image filter.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Filter {
    /// Multiplies alpha by a factor in `0..=1`.
    Opacity(f32),
    /// Replaces colors, keeping alpha.
    Tint(Color),
    /// Transforms the image, keeping its size.
    Transform(tiny_skia::Transform),
    /// Scales the image down by a factor in `0..=1`.
    Downsample(f32),
}

/// A hashable form of [`Filter`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum FilterKey {
    Opacity(u32),
    Tint(Color),
    Transform([u32; 6]),
    Downsample(u32),
}

impl From<Filter> for FilterKey {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Opacity(v) => FilterKey::Opacity(v.to_bits()),
            Filter::Tint(c) => FilterKey::Tint(c),
            Filter::Transform(ts) => FilterKey::Transform([
                ts.sx.to_bits(),
                ts.ky.to_bits(),
                ts.kx.to_bits(),
                ts.sy.to_bits(),
                ts.tx.to_bits(),
                ts.ty.to_bits(),
            ]),
            Filter::Downsample(v) => FilterKey::Downsample(v.to_bits()),
        }
    }
}

/// Context counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Stats {
    /// Images created by this context.
    pub images_created: usize,
    /// Filters applied, including cached ones.
    pub filters_applied: usize,
    /// Filters answered from the intermediate cache.
    pub cache_hits: usize,
    /// Currently cached filter results.
    pub cached_intermediates: usize,
}

/// Maximum number of filter results kept by a context.
///
/// Least recently used results are evicted first.
pub const INTERMEDIATE_CACHE_CAPACITY: usize = 32;

/// An image-processing context.
///
/// Owns all of its state: two contexts never share caches or counters.
pub struct Context {
    options: ContextOptions,
    cache: LruCache<(u64, FilterKey), Image>,
    stats: Stats,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("options", &self.options)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Context {
    /// Creates a context after validating `options`.
    pub fn new(options: ContextOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        let ctx = Context {
            options,
            cache: LruCache::new(
                NonZeroUsize::new(INTERMEDIATE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            ),
            stats: Stats::default(),
        };
        log::debug!("Context '{}' created.", ctx.name());
        Ok(ctx)
    }

    /// Returns the options the context was created with.
    #[inline]
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    /// Returns the context name, or `unnamed`.
    pub fn name(&self) -> &str {
        self.options.name.as_deref().unwrap_or("unnamed")
    }

    /// Returns context counters.
    pub fn stats(&self) -> Stats {
        Stats {
            cached_intermediates: self.cache.len(),
            ..self.stats
        }
    }

    /// Drops all cached filter results.
    pub fn clear_caches(&mut self) {
        log::trace!(
            "Context '{}': dropping {} cached images.",
            self.name(),
            self.cache.len()
        );
        self.cache.clear();
    }

    /// Creates a transparent image.
    pub fn create_image(&mut self, width: u32, height: u32) -> Result<Image, ImageError> {
        let pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or(ImageError::InvalidSize { width, height })?;
        self.stats.images_created += 1;
        Ok(Image::new(pixmap))
    }

    /// Creates an image from demultiplied RGBA8 sRGB data.
    pub fn image_from_rgba(
        &mut self,
        width: u32,
        height: u32,
        mut data: Vec<u8>,
    ) -> Result<Image, ImageError> {
        let size = tiny_skia::IntSize::from_wh(width, height)
            .ok_or(ImageError::InvalidSize { width, height })?;
        encode::premultiply_alpha(data.as_rgba_mut());
        let pixmap = tiny_skia::Pixmap::from_vec(data, size)
            .ok_or(ImageError::InvalidSize { width, height })?;
        self.stats.images_created += 1;
        Ok(Image::new(pixmap))
    }

    /// Fills a path.
    ///
    /// Fails with [`ImageError::EmptyPath`] when the path has no area.
    /// The image is left untouched then.
    pub fn fill_path(
        &mut self,
        image: &mut Image,
        path: &tiny_skia::Path,
        fill: &Fill,
        transform: tiny_skia::Transform,
    ) -> Result<(), ImageError> {
        path::fill_path(path, fill, transform, &mut image.pixmap.as_mut())?;
        image.touch();
        Ok(())
    }

    /// Strokes a path.
    ///
    /// Fails with [`ImageError::InvalidStroke`] for a non-positive or
    /// non-finite width.
    pub fn stroke_path(
        &mut self,
        image: &mut Image,
        path: &tiny_skia::Path,
        stroke: &Stroke,
        transform: tiny_skia::Transform,
    ) -> Result<(), ImageError> {
        path::stroke_path(path, stroke, transform, &mut image.pixmap.as_mut())?;
        image.touch();
        Ok(())
    }

    /// Rasterizes glyph outlines.
    ///
    /// The image covers the layout rectangle of `path`, scaled by `scale`.
    pub fn render_glyph_path(
        &mut self,
        path: &GlyphPath,
        color: Color,
        scale: f32,
    ) -> Result<Image, ImageError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ImageError::InvalidFilter(format!(
                "scale must be positive, got {}",
                scale
            )));
        }

        let rect = path.layout_rect();
        let width = (rect.width() * scale).ceil().max(1.0) as u32;
        let height = (rect.height() * scale).ceil().max(1.0) as u32;
        let mut image = self.create_image(width, height)?;

        if let Some(data) = path.data() {
            let ts = tiny_skia::Transform::from_scale(scale, scale)
                .pre_translate(-rect.x(), -rect.y());
            self.fill_path(&mut image, data, &Fill::from_color(color), ts)?;
        }

        Ok(image)
    }

    /// Applies a filter and returns a new image.
    ///
    /// With `cache_intermediates` enabled, applying the same filter to the
    /// same unmodified image returns the cached result. At most
    /// [`INTERMEDIATE_CACHE_CAPACITY`] results are kept.
    pub fn apply(&mut self, image: &Image, filter: Filter) -> Result<Image, ImageError> {
        self.stats.filters_applied += 1;

        let cache = self.options.cache_intermediates.unwrap_or(false);
        let key = (image.id, FilterKey::from(filter));
        if cache {
            if let Some(cached) = self.cache.get(&key) {
                self.stats.cache_hits += 1;
                return Ok(cached.clone());
            }
        }

        let pixmap = self.run_filter(image, filter)?;
        self.stats.images_created += 1;
        let result = Image::new(pixmap);

        if cache {
            self.cache.put(key, result.clone());
        }

        Ok(result)
    }

    fn run_filter(&self, image: &Image, filter: Filter) -> Result<tiny_skia::Pixmap, ImageError> {
        let src = image.pixmap.as_ref();
        let new_pixmap = |w, h| {
            tiny_skia::Pixmap::new(w, h).ok_or(ImageError::InvalidSize { width: w, height: h })
        };

        match filter {
            Filter::Opacity(opacity) => {
                check_factor("opacity", opacity, true)?;
                let mut dst = new_pixmap(image.width(), image.height())?;
                let paint = tiny_skia::PixmapPaint {
                    opacity,
                    ..tiny_skia::PixmapPaint::default()
                };
                dst.draw_pixmap(0, 0, src, &paint, tiny_skia::Transform::identity(), None);
                Ok(dst)
            }
            Filter::Tint(color) => {
                let mut dst = image.pixmap.clone();
                let (width, height) = (image.width(), image.height());
                let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, width as f32, height as f32)
                    .ok_or(ImageError::InvalidSize { width, height })?;
                let mut paint = tiny_skia::Paint::default();
                paint.set_color_rgba8(color.red, color.green, color.blue, color.alpha);
                paint.blend_mode = tiny_skia::BlendMode::SourceIn;
                dst.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
                Ok(dst)
            }
            Filter::Transform(ts) => {
                if !ts.is_valid() {
                    return Err(ImageError::InvalidFilter(format!(
                        "{:?} is not invertible",
                        ts
                    )));
                }

                let mut dst = new_pixmap(image.width(), image.height())?;
                let paint = tiny_skia::PixmapPaint {
                    quality: self.filter_quality(),
                    ..tiny_skia::PixmapPaint::default()
                };
                dst.draw_pixmap(0, 0, src, &paint, ts, None);
                Ok(dst)
            }
            Filter::Downsample(factor) => {
                check_factor("downsample factor", factor, false)?;
                let width = ((image.width() as f32 * factor).ceil() as u32).max(1);
                let height = ((image.height() as f32 * factor).ceil() as u32).max(1);

                let mut dst = new_pixmap(width, height)?;
                let paint = tiny_skia::PixmapPaint {
                    quality: self.filter_quality(),
                    ..tiny_skia::PixmapPaint::default()
                };
                let ts = tiny_skia::Transform::from_scale(factor, factor);
                dst.draw_pixmap(0, 0, src, &paint, ts, None);
                Ok(dst)
            }
        }
    }

    fn filter_quality(&self) -> tiny_skia::FilterQuality {
        if self.options.high_quality_downsample.unwrap_or(false) {
            tiny_skia::FilterQuality::Bicubic
        } else {
            tiny_skia::FilterQuality::Nearest
        }
    }

    /// Returns RGBA8 pixels in the output color space.
    ///
    /// Pixels stay premultiplied unless `output_premultiplied` is `false`.
    pub fn output_bytes(&self, image: &Image) -> Vec<u8> {
        let premultiplied = self.options.output_premultiplied.unwrap_or(true);
        let linear = self.options.output_color_space == Some(ColorSpace::LinearSrgb);

        if premultiplied && !linear {
            return image.pixmap.data().to_vec();
        }

        let mut data = encode::demultiplied(image.pixmap.data());
        if linear {
            encode::srgb_to_linear(data.as_rgba_mut());
        }
        if premultiplied {
            encode::premultiply_alpha(data.as_rgba_mut());
        }
        data
    }

    /// Encodes an image as PNG with DPI metadata.
    pub fn encode_png(&self, image: &Image, dpi: u32) -> Result<Vec<u8>, ImageError> {
        let data = encode::demultiplied(image.pixmap.data());
        Ok(encode::encode_png(&data, image.width(), image.height(), dpi)?)
    }
}

fn check_factor(name: &str, value: f32, allow_zero: bool) -> Result<(), ImageError> {
    let in_range = if allow_zero {
        (0.0..=1.0).contains(&value)
    } else {
        value > 0.0 && value <= 1.0
    };

    if in_range {
        Ok(())
    } else {
        Err(ImageError::InvalidFilter(format!(
            "{} must be in 0..=1, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_square(ctx: &mut Context) -> Image {
        let mut image = ctx.create_image(10, 10).unwrap();
        let rect = tiny_skia::Rect::from_xywh(0.0, 0.0, 10.0, 10.0).unwrap();
        let path = tiny_skia::PathBuilder::from_rect(rect);
        let fill = Fill {
            color: Color::new_rgba(255, 0, 0, 255),
            anti_alias: false,
            ..Fill::default()
        };
        ctx.fill_path(&mut image, &path, &fill, tiny_skia::Transform::identity())
            .unwrap();
        image
    }

    #[test]
    fn fill_changes_image_id() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        let blank = ctx.create_image(10, 10).unwrap();
        let image = red_square(&mut ctx);

        assert_ne!(blank.id(), image.id());
        let px = image.pixel(5, 5).unwrap();
        assert_eq!((px.red(), px.alpha()), (255, 255));
    }

    #[test]
    fn stroke_line() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        let mut image = ctx.create_image(10, 10).unwrap();
        let id = image.id();

        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(0.0, 5.0);
        pb.line_to(10.0, 5.0);
        let path = pb.finish().unwrap();

        let stroke = Stroke {
            width: 2.0,
            round: false,
            ..Stroke::default()
        };
        ctx.stroke_path(&mut image, &path, &stroke, tiny_skia::Transform::identity())
            .unwrap();

        assert_ne!(image.id(), id);
        assert_eq!(image.pixel(5, 4).unwrap().alpha(), 255);
        assert_eq!(image.pixel(5, 1).unwrap().alpha(), 0);
    }

    #[test]
    fn degenerate_drawing_is_reported() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        let mut image = ctx.create_image(10, 10).unwrap();
        let id = image.id();

        let mut pb = tiny_skia::PathBuilder::new();
        pb.move_to(0.0, 5.0);
        pb.line_to(10.0, 5.0);
        let line = pb.finish().unwrap();
        let ts = tiny_skia::Transform::identity();

        let err = ctx.fill_path(&mut image, &line, &Fill::default(), ts).unwrap_err();
        assert!(matches!(err, ImageError::EmptyPath));

        for width in [0.0, -1.0, f32::NAN] {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            let err = ctx.stroke_path(&mut image, &line, &stroke, ts).unwrap_err();
            assert!(matches!(err, ImageError::InvalidStroke(_)));
        }

        assert_eq!(image.id(), id);
        assert_eq!(image.pixel(5, 5).unwrap().alpha(), 0);
    }

    #[test]
    fn opacity_and_tint() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        let image = red_square(&mut ctx);

        let faded = ctx.apply(&image, Filter::Opacity(0.5)).unwrap();
        let alpha = faded.pixel(5, 5).unwrap().alpha();
        assert!((alpha as i32 - 128).abs() <= 1);

        let blue = ctx.apply(&image, Filter::Tint(Color::new_rgba(0, 0, 255, 255))).unwrap();
        let px = blue.pixel(5, 5).unwrap();
        assert_eq!((px.red(), px.blue(), px.alpha()), (0, 255, 255));

        assert!(ctx.apply(&image, Filter::Opacity(1.5)).is_err());
    }

    #[test]
    fn downsample_shrinks() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        let image = red_square(&mut ctx);
        let half = ctx.apply(&image, Filter::Downsample(0.5)).unwrap();

        assert_eq!((half.width(), half.height()), (5, 5));
        assert!(ctx.apply(&image, Filter::Downsample(0.0)).is_err());
    }

    #[test]
    fn caches_only_when_enabled() {
        let mut plain = Context::new(ContextOptions::default()).unwrap();
        let image = red_square(&mut plain);
        plain.apply(&image, Filter::Opacity(0.5)).unwrap();
        plain.apply(&image, Filter::Opacity(0.5)).unwrap();
        assert_eq!(plain.stats().cache_hits, 0);

        let mut caching = Context::new(ContextOptions {
            cache_intermediates: Some(true),
            ..ContextOptions::default()
        })
        .unwrap();
        let first = caching.apply(&image, Filter::Opacity(0.5)).unwrap();
        let second = caching.apply(&image, Filter::Opacity(0.5)).unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(caching.stats().cache_hits, 1);
        assert_eq!(caching.stats().cached_intermediates, 1);

        caching.clear_caches();
        assert_eq!(caching.stats().cached_intermediates, 0);
    }

    #[test]
    fn cache_is_bounded() {
        let mut ctx = Context::new(ContextOptions {
            cache_intermediates: Some(true),
            ..ContextOptions::default()
        })
        .unwrap();
        let mut image = red_square(&mut ctx);
        let dot = tiny_skia::PathBuilder::from_rect(
            tiny_skia::Rect::from_xywh(0.0, 0.0, 1.0, 1.0).unwrap(),
        );

        // Every fill makes the previous cache entry unreachable.
        for _ in 0..INTERMEDIATE_CACHE_CAPACITY * 3 {
            ctx.apply(&image, Filter::Opacity(0.5)).unwrap();
            ctx.fill_path(&mut image, &dot, &Fill::default(), tiny_skia::Transform::identity())
                .unwrap();
            assert!(ctx.stats().cached_intermediates <= INTERMEDIATE_CACHE_CAPACITY);
        }
        assert_eq!(ctx.stats().cached_intermediates, INTERMEDIATE_CACHE_CAPACITY);

        // The most recent result survives eviction.
        let last = ctx.apply(&image, Filter::Opacity(0.5)).unwrap();
        let again = ctx.apply(&image, Filter::Opacity(0.5)).unwrap();
        assert_eq!(last.id(), again.id());
    }

    #[test]
    fn output_bytes_respect_options() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        let image = ctx.image_from_rgba(1, 1, vec![200, 100, 0, 128]).unwrap();
        let premultiplied = ctx.output_bytes(&image);
        assert!(premultiplied[0] < 200);

        let straight = Context::new(ContextOptions {
            output_premultiplied: Some(false),
            ..ContextOptions::default()
        })
        .unwrap();
        let bytes = straight.output_bytes(&image);
        assert!((bytes[0] as i32 - 200).abs() <= 2);
        assert_eq!(bytes[3], 128);
    }

    #[test]
    fn zero_sized_images_are_rejected() {
        let mut ctx = Context::new(ContextOptions::default()).unwrap();
        assert!(matches!(ctx.create_image(0, 10), Err(ImageError::InvalidSize { .. })));
    }
}
