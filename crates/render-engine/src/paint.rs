//! Raster primitives on straight-alpha RGBA buffers.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_circle_mut;

/// Source-over blend of `color` into `dst`, with `coverage` scaling the source alpha.
#[inline]
pub fn blend_pixel(dst: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let sa = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let v = (color[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Blend `src` over `dst` with its top-left corner at `(x, y)`.
///
/// `opacity` multiplies the source alpha and is clamped to `[0, 1]`.
/// Parts of `src` outside `dst` are ignored.
pub fn blend_at(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64, opacity: f64) {
    let opacity = opacity.clamp(0.0, 1.0) as f32;
    if opacity <= 0.0 {
        return;
    }
    let (dw, dh) = (dst.width() as i64, dst.height() as i64);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + src.width() as i64).min(dw);
    let y1 = (y + src.height() as i64).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = *src.get_pixel((dx - x) as u32, (dy - y) as u32);
            if s[3] == 0 {
                continue;
            }
            blend_pixel(dst.get_pixel_mut(dx as u32, dy as u32), s, opacity);
        }
    }
}

/// Blend a same-size layer over `dst`.
pub fn blend_layer(dst: &mut RgbaImage, src: &RgbaImage, opacity: f64) {
    blend_at(dst, src, 0, 0, opacity);
}

/// Blended axis-aligned rectangle.
pub fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
    let (iw, ih) = (img.width() as i64, img.height() as i64);
    let (x0, y0) = ((x as i64).max(0), (y as i64).max(0));
    let x1 = (x as i64 + w as i64).min(iw);
    let y1 = (y as i64 + h as i64).min(ih);
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(img.get_pixel_mut(px as u32, py as u32), color, 1.0);
        }
    }
}

/// Opaque filled circle. Overwrites whatever is underneath.
pub fn fill_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    draw_filled_circle_mut(img, (cx, cy), radius, color);
}

/// Blended rectangle with circular corners.
///
/// Every covered pixel is blended exactly once, so translucent fills stay
/// uniform where the corner arcs meet the straight edges.
pub fn fill_rounded_rect(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    w: u32,
    h: u32,
    radius: u32,
    color: Rgba<u8>,
) {
    if w == 0 || h == 0 {
        return;
    }
    let r = radius.min(w / 2).min(h / 2) as f64;
    let (iw, ih) = (img.width() as i64, img.height() as i64);
    let (x, y) = (x as i64, y as i64);
    let left = x as f64;
    let top = y as f64;
    let right = (x + w as i64) as f64;
    let bottom = (y + h as i64) as f64;

    for py in y.max(0)..(y + h as i64).min(ih) {
        for px in x.max(0)..(x + w as i64).min(iw) {
            let fx = px as f64 + 0.5;
            let fy = py as f64 + 0.5;
            let cx = fx.clamp(left + r, right - r);
            let cy = fy.clamp(top + r, bottom - r);
            let (dx, dy) = (fx - cx, fy - cy);
            if dx * dx + dy * dy <= r * r {
                blend_pixel(img.get_pixel_mut(px as u32, py as u32), color, 1.0);
            }
        }
    }
}

/// Black band whose alpha rises linearly from 0 at `y0` to `max_alpha` at the bottom.
pub fn bottom_gradient(img: &mut RgbaImage, height: u32, max_alpha: u8) {
    let h = height.min(img.height());
    let y0 = img.height() - h;
    for i in 0..h {
        let a = (max_alpha as f32 * (i as f32 / h as f32)) as u8;
        let color = Rgba([0, 0, 0, a]);
        for x in 0..img.width() {
            blend_pixel(img.get_pixel_mut(x, y0 + i), color, 1.0);
        }
    }
}

/// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa`.
pub fn parse_hex_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.trim().strip_prefix('#')?;
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba([
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            255,
        ])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}
