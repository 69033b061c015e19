// Copyright 2020 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use once_cell::sync::Lazy;
use paintkit::glyphpath::{
    Alignment, AttributedString, Attributes, BoxShaper, Color, Error, Font, ParagraphStyle, Rect,
    Size,
};
use paintkit::{ColorSpace, ConfigError, ContextOptions, Filter, PixelFormat, Utility};

mod context;

static UTILITY: Lazy<Utility> = Lazy::new(|| {
    if let Ok(()) = log::set_logger(&LOGGER) {
        log::set_max_level(log::LevelFilter::Warn);
    }

    Utility::new(Arc::new(BoxShaper))
});

fn text(s: &str, size: f32) -> AttributedString {
    AttributedString::new(s, Attributes::with_font(Font::with_size(size)))
}

#[test]
fn path_in_rect_is_not_empty() {
    let rect = Rect::from_xywh(0.0, 0.0, 200.0, 50.0).unwrap();
    let path = UTILITY.path_in_rect(&text("Paint", 20.0), rect).unwrap();
    assert!(!path.is_empty());
    assert_eq!(path.contour_count(), 5);
}

#[test]
fn single_line_path_rejects_zero_size() {
    let err = UTILITY.single_line_path("A", 0.0).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { .. }));
}

#[test]
fn single_line_path_ignores_line_breaks() {
    let path = UTILITY.single_line_path("a\nb", 10.0).unwrap();
    assert_eq!(path.line_count(), 1);
    assert_eq!(path.contour_count(), 2);
}

#[test]
fn max_size_is_respected() {
    let s = text("The quick brown fox jumps over the lazy dog", 18.0);
    let max = Size::from_wh(100.0, 60.0).unwrap();
    let path = UTILITY.path_with_max_size(&s, max).unwrap();

    let bounds = path.bounds().unwrap();
    assert!(bounds.right() <= 100.0 + 1e-3);
    assert!(bounds.bottom() <= 60.0 + 1e-3);
    assert!(path.layout_rect().width() <= 100.0 + 1e-3);
    assert!(path.layout_rect().height() <= 60.0 + 1e-3);
}

#[test]
fn natural_bounds_round_trip() {
    let s = text("Round\ntrip", 16.0);
    let natural = UTILITY.path(&s).unwrap();
    let boxed = UTILITY.path_in_rect(&s, natural.layout_rect()).unwrap();

    assert_eq!(natural.line_count(), 2);
    assert_eq!(natural.to_svg_data(), boxed.to_svg_data());
}

#[test]
fn whitespace_only_text_is_empty() {
    let path = UTILITY.path(&text("   ", 12.0)).unwrap();
    assert!(path.is_empty());
    assert_eq!(path.to_svg_data(), "");
}

#[test]
fn utility_is_shared_between_threads() {
    let expected = UTILITY.single_line_path("threads", 14.0).unwrap().to_svg_data();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            std::thread::spawn(|| {
                UTILITY
                    .single_line_path("threads", 14.0)
                    .unwrap()
                    .to_svg_data()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn unsupported_options_are_rejected() {
    let err = Utility::image_context(ContextOptions {
        use_software_renderer: Some(false),
        ..ContextOptions::default()
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::Unsupported { .. }));

    let err = Utility::image_context(ContextOptions {
        working_color_space: Some(ColorSpace::LinearSrgb),
        working_format: Some(PixelFormat::Rgba8),
        ..ContextOptions::default()
    })
    .unwrap_err();
    assert!(matches!(err, ConfigError::Conflict { .. }));

    let err = ContextOptions::from_pairs([("kCIContextColorDepth", 8.0)]).unwrap_err();
    assert_eq!(err, ConfigError::UnknownKey("kCIContextColorDepth".to_string()));
}

#[test]
fn glyph_path_renders_to_png() {
    let path = UTILITY.single_line_path("Hi", 20.0).unwrap();
    let mut ctx = Utility::image_context(ContextOptions::default()).unwrap();
    let image = ctx.render_glyph_path(&path, Color::black(), 1.0).unwrap();

    assert_eq!((image.width(), image.height()), (24, 20));
    // Inside the first box.
    assert_eq!(image.pixel(5, 10).unwrap().alpha(), 255);
    // Between the boxes.
    assert_eq!(image.pixel(12, 10).unwrap().alpha(), 0);

    let png = ctx.encode_png(&image, 300).unwrap();
    assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
}

#[test]
fn scaled_rendering() {
    let path = UTILITY.single_line_path("Hi", 20.0).unwrap();
    let mut ctx = Utility::image_context(ContextOptions::default()).unwrap();
    let image = ctx.render_glyph_path(&path, Color::black(), 2.0).unwrap();
    assert_eq!((image.width(), image.height()), (48, 40));

    let half = ctx.apply(&image, Filter::Downsample(0.5)).unwrap();
    assert_eq!((half.width(), half.height()), (24, 20));
}

#[test]
fn aligned_max_size_path_renders() {
    let attrs = Attributes {
        font: Font::with_size(10.0),
        paragraph: ParagraphStyle {
            alignment: Alignment::Center,
            ..ParagraphStyle::default()
        },
        ..Attributes::default()
    };
    let s = AttributedString::new("ab", attrs);
    let path = UTILITY
        .path_with_max_size(&s, Size::from_wh(1000.0, 100.0).unwrap())
        .unwrap();

    let mut ctx = Utility::image_context(ContextOptions::default()).unwrap();
    let image = ctx.render_glyph_path(&path, Color::black(), 1.0).unwrap();

    assert_eq!((image.width(), image.height()), (12, 10));
    // Both boxes land inside the image.
    assert_eq!(image.pixel(3, 5).unwrap().alpha(), 255);
    assert_eq!(image.pixel(9, 5).unwrap().alpha(), 255);
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::LevelFilter::Warn
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);
            eprintln!("{} (in {}:{}): {}", record.level(), target, line, record.args());
        }
    }

    fn flush(&self) {}
}
