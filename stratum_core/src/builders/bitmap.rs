// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Offscreen bitmap production for icon and symbol layers.
//!
//! Symbol layers can only reference images that are already registered with
//! the surface, so pins and annotation badges are rasterized here into owned
//! RGBA buffers first. Shapes are filled by 2x2 supersampled point-in-shape
//! coverage, which is plenty for marker-sized bitmaps, and the result is
//! cropped to its non-transparent content before registration.

use image::{Rgba, RgbaImage};
use kurbo::{Circle, Point, Shape, Triangle};

use crate::surface::ImageData;

/// Coverage of a pixel by a shape, sampled at 2x2 subpixel centers.
fn coverage(shape: &impl Shape, x: u32, y: u32) -> f64 {
    const OFFSETS: [(f64, f64); 4] = [(0.25, 0.25), (0.75, 0.25), (0.25, 0.75), (0.75, 0.75)];
    let hits = OFFSETS
        .iter()
        .filter(|(dx, dy)| shape.contains(Point::new(f64::from(x) + dx, f64::from(y) + dy)))
        .count();
    hits as f64 / OFFSETS.len() as f64
}

/// Source-over blend of a straight-alpha color onto a pixel.
fn blend(px: &mut Rgba<u8>, (r, g, b): (u8, u8, u8), alpha: f64) {
    if alpha <= 0.0 {
        return;
    }
    let src_a = alpha.clamp(0.0, 1.0);
    let dst_a = f64::from(px.0[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }
    let mix = |src: u8, dst: u8| {
        let s = f64::from(src) * src_a;
        let d = f64::from(dst) * dst_a * (1.0 - src_a);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "channel math is clamped to 0..=255 before the cast"
        )]
        let v = ((s + d) / out_a).clamp(0.0, 255.0).round() as u8;
        v
    };
    #[expect(
        clippy::cast_possible_truncation,
        reason = "alpha is clamped to 0..=1 before scaling to a byte"
    )]
    let a = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *px = Rgba([mix(r, px.0[0]), mix(g, px.0[1]), mix(b, px.0[2]), a]);
}

/// Fills a shape into the image with the given color.
fn fill_shape(img: &mut RgbaImage, shape: &impl Shape, color: (u8, u8, u8)) {
    for y in 0..img.height() {
        for x in 0..img.width() {
            let cov = coverage(shape, x, y);
            if cov > 0.0 {
                blend(img.get_pixel_mut(x, y), color, cov);
            }
        }
    }
}

/// Crops the image to the bounding box of its non-transparent pixels.
///
/// A fully transparent image is returned unchanged.
fn crop_to_content(img: &RgbaImage) -> RgbaImage {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    for (x, y, px) in img.enumerate_pixels() {
        if px.0[3] > 0 {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x {
        return img.clone();
    }
    image::imageops::crop_imm(img, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1).to_image()
}

fn to_image_data(img: RgbaImage) -> ImageData {
    ImageData {
        width: img.width(),
        height: img.height(),
        pixels: img.into_raw(),
    }
}

/// Rasterizes the shared location pin: a colored head with a white core and
/// a tail tapering to the anchor point.
pub(crate) fn rasterize_pin(color: (u8, u8, u8)) -> ImageData {
    const W: u32 = 24;
    const H: u32 = 36;
    let mut img = RgbaImage::new(W, H);

    let head = Circle::new(Point::new(12.0, 12.0), 9.0);
    let tail = Triangle::new(
        Point::new(4.5, 16.5),
        Point::new(19.5, 16.5),
        Point::new(12.0, 34.0),
    );
    let core = Circle::new(Point::new(12.0, 12.0), 3.5);

    fill_shape(&mut img, &tail, color);
    fill_shape(&mut img, &head, color);
    fill_shape(&mut img, &core, (255, 255, 255));

    to_image_data(crop_to_content(&img))
}

/// Rasterizes an annotation badge: a colored disc with a white ring, sized
/// by the symbol definition and cropped to content.
pub(crate) fn rasterize_badge(size: u32, color: (u8, u8, u8)) -> ImageData {
    let size = size.clamp(8, 256);
    let mut img = RgbaImage::new(size, size);

    let half = f64::from(size) / 2.0;
    let center = Point::new(half, half);
    let disc = Circle::new(center, half - 1.0);
    let ring_outer = Circle::new(center, half * 0.72);
    let ring_inner = Circle::new(center, half * 0.58);

    fill_shape(&mut img, &disc, color);
    fill_shape(&mut img, &ring_outer, (255, 255, 255));
    fill_shape(&mut img, &ring_inner, color);

    to_image_data(crop_to_content(&img))
}
