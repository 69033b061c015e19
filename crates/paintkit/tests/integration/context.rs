// Copyright 2026 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use paintkit::glyphpath::Color;
use paintkit::tiny_skia::{PathBuilder, Rect, Transform};
use paintkit::{ColorSpace, Context, ContextOptions, Fill, Filter, Image, Stats, Utility};

fn caching_options() -> ContextOptions {
    ContextOptions::from_pairs([
        ("kCIContextCacheIntermediates", true),
        ("kCIContextHighQualityDownsample", true),
    ])
    .unwrap()
}

fn square(ctx: &mut Context) -> Image {
    let mut image = ctx.create_image(8, 8).unwrap();
    let path = PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, 8.0, 8.0).unwrap());
    ctx.fill_path(
        &mut image,
        &path,
        &Fill::from_color(Color::new_rgba(0, 128, 255, 255)),
        Transform::identity(),
    )
    .unwrap();
    image
}

#[test]
fn identical_options_make_independent_contexts() {
    let mut first = Utility::image_context(caching_options()).unwrap();
    let mut second = Utility::image_context(caching_options()).unwrap();

    let image = square(&mut first);
    let a = first.apply(&image, Filter::Opacity(0.25)).unwrap();
    let b = first.apply(&image, Filter::Opacity(0.25)).unwrap();
    assert_eq!(a.id(), b.id());
    assert_eq!(first.stats().cache_hits, 1);

    // Nothing leaks into the second context.
    assert_eq!(second.stats(), Stats::default());

    let c = second.apply(&image, Filter::Opacity(0.25)).unwrap();
    assert_ne!(a.id(), c.id());
    assert_eq!(second.stats().cache_hits, 0);
    assert_eq!(a.pixmap().data(), c.pixmap().data());

    first.clear_caches();
    assert_eq!(first.stats().cached_intermediates, 0);
    assert_eq!(second.stats().cached_intermediates, 1);
}

#[test]
fn modified_image_misses_cache() {
    let mut ctx = Utility::image_context(caching_options()).unwrap();
    let mut image = square(&mut ctx);
    ctx.apply(&image, Filter::Tint(Color::white())).unwrap();

    let path = PathBuilder::from_rect(Rect::from_xywh(0.0, 0.0, 2.0, 2.0).unwrap());
    ctx.fill_path(&mut image, &path, &Fill::default(), Transform::identity())
        .unwrap();
    ctx.apply(&image, Filter::Tint(Color::white())).unwrap();

    assert_eq!(ctx.stats().cache_hits, 0);
    assert_eq!(ctx.stats().cached_intermediates, 2);
}

#[test]
fn transform_filter_keeps_size() {
    let mut ctx = Utility::image_context(ContextOptions::default()).unwrap();
    let image = square(&mut ctx);
    let moved = ctx.apply(&image, Filter::Transform(Transform::from_translate(4.0, 0.0))).unwrap();

    assert_eq!((moved.width(), moved.height()), (8, 8));
    assert_eq!(moved.pixel(1, 4).unwrap().alpha(), 0);
    assert_eq!(moved.pixel(6, 4).unwrap().alpha(), 255);
}

#[test]
fn linear_output() {
    let options = ContextOptions {
        output_color_space: Some(ColorSpace::LinearSrgb),
        ..ContextOptions::default()
    };
    let mut ctx = Utility::image_context(options).unwrap();
    let image = ctx.image_from_rgba(1, 1, vec![188, 0, 255, 255]).unwrap();

    let bytes = ctx.output_bytes(&image);
    assert!((bytes[0] as i32 - 128).abs() <= 2);
    assert_eq!(&bytes[1..], &[0, 255, 255]);
}

#[test]
fn named_context() {
    let ctx = Context::new(ContextOptions::from_pairs([("name", "brush")]).unwrap()).unwrap();
    assert_eq!(ctx.name(), "brush");

    let err = Context::new(ContextOptions::from_pairs([("name", " ")]).unwrap()).unwrap_err();
    assert!(matches!(err, paintkit::ConfigError::InvalidValue { key: "name", .. }));
}
