// Copyright 2017 the Resvg Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use rgb::{FromSlice, RGBA8};

/// Demultiplies provided pixels alpha.
pub(crate) fn demultiply_alpha(data: &mut [RGBA8]) {
    for p in data {
        if p.a != 0 && p.a != 255 {
            let a = p.a as f32 / 255.0;
            p.r = (p.r as f32 / a + 0.5).min(255.0) as u8;
            p.g = (p.g as f32 / a + 0.5).min(255.0) as u8;
            p.b = (p.b as f32 / a + 0.5).min(255.0) as u8;
        }
    }
}

/// Multiplies provided pixels by alpha.
pub(crate) fn premultiply_alpha(data: &mut [RGBA8]) {
    for p in data {
        if p.a != 255 {
            let a = p.a as f32 / 255.0;
            p.r = (p.r as f32 * a + 0.5) as u8;
            p.g = (p.g as f32 * a + 0.5) as u8;
            p.b = (p.b as f32 * a + 0.5) as u8;
        }
    }
}

/// Converts demultiplied sRGB pixels to linear sRGB.
pub(crate) fn srgb_to_linear(data: &mut [RGBA8]) {
    let table: Vec<u8> = (0..=255u8)
        .map(|v| {
            let c = v as f32 / 255.0;
            let l = if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            };
            (l * 255.0 + 0.5) as u8
        })
        .collect();

    for p in data {
        p.r = table[p.r as usize];
        p.g = table[p.g as usize];
        p.b = table[p.b as usize];
    }
}

/// Encodes RGBA8 data as PNG with DPI metadata in the pHYs chunk.
///
/// `data` must be demultiplied.
pub(crate) fn encode_png(
    data: &[u8],
    width: u32,
    height: u32,
    dpi: u32,
) -> Result<Vec<u8>, png::EncodingError> {
    // 1 inch = 0.0254 meters, so pixels_per_meter = dpi / 0.0254
    let pixels_per_meter = (dpi as f64 / 0.0254).round() as u32;

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: pixels_per_meter,
            yppu: pixels_per_meter,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(data)?;
    }

    Ok(out)
}

/// Returns a demultiplied copy of premultiplied RGBA8 data.
pub(crate) fn demultiplied(data: &[u8]) -> Vec<u8> {
    let mut tmp = data.to_vec();
    demultiply_alpha(tmp.as_rgba_mut());
    tmp
}
