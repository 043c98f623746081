//! Font lookup, text measurement, greedy wrapping, and glyph drawing.

use std::path::PathBuf;

use ab_glyph::{point, Font, FontArc, FontVec, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use reelforge_common::config::FontConfig;
use reelforge_common::error::{ReelError, ReelResult};

use crate::paint::{blend_pixel, fill_rounded_rect};

/// Font used when no configured or platform font can be loaded.
const BUILTIN_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Extra vertical space between wrapped lines, in pixels.
pub const LINE_SPACING: f32 = 8.0;

/// Resolved font plus the path it was loaded from.
#[derive(Clone)]
pub struct FontBook {
    font: FontArc,
    source: Option<PathBuf>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("source", &self.source)
            .finish()
    }
}

impl FontBook {
    /// First candidate that loads, else the built-in font.
    pub fn resolve(config: &FontConfig) -> ReelResult<Self> {
        for path in config.candidates() {
            if !path.exists() {
                continue;
            }
            match std::fs::read(&path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    FontVec::try_from_vec_and_index(bytes, 0).map_err(|e| e.to_string())
                }) {
                Ok(font) => {
                    tracing::debug!(path = %path.display(), "Loaded font");
                    return Ok(Self {
                        font: FontArc::new(font),
                        source: Some(path),
                    });
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unloadable font");
                }
            }
        }
        tracing::debug!("Using built-in font");
        Self::builtin()
    }

    /// The embedded fallback font.
    pub fn builtin() -> ReelResult<Self> {
        let font = FontArc::try_from_slice(BUILTIN_FONT)
            .map_err(|e| ReelError::font(format!("built-in font failed to load: {e}")))?;
        Ok(Self { font, source: None })
    }

    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// Advance width of a single line at `size` px.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }

    /// Height of one line (ascent to descent) at `size` px.
    pub fn line_height(&self, size: f32) -> f32 {
        self.font.as_scaled(PxScale::from(size)).height()
    }

    /// Draw one line with its top-left corner at `(x, y)`.
    ///
    /// Coverage is blended through [`blend_pixel`], so drawing onto a
    /// transparent layer keeps clean antialiased edges.
    pub fn draw_line(&self, img: &mut RgbaImage, text: &str, x: f32, y: f32, size: f32, color: Rgba<u8>) {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let baseline = y + scaled.ascent();
        let (iw, ih) = (img.width() as i64, img.height() as i64);

        let mut caret = x;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(p) = prev {
                caret += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i64 + gx as i64;
                let py = bounds.min.y as i64 + gy as i64;
                if px >= 0 && py >= 0 && px < iw && py < ih {
                    blend_pixel(img.get_pixel_mut(px as u32, py as u32), color, coverage);
                }
            });
        }
    }
}

/// Greedy word wrap.
///
/// Words accumulate while the measured line fits in `max_width`. The word
/// that overflows starts the next line; a single word wider than
/// `max_width` is emitted alone. Explicit newlines start a new line.
/// Lines past `max_lines` are dropped.
pub fn wrap_lines<F>(text: &str, max_width: f32, max_lines: usize, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    if max_lines == 0 {
        return lines;
    }

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
                if lines.len() >= max_lines {
                    return lines;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
            if lines.len() >= max_lines {
                return lines;
            }
        }
    }
    lines
}

/// Horizontal placement of lines inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Style for a block of text.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgba<u8>,
    pub align: Align,
    pub outline_width: u32,
    pub outline_color: Rgba<u8>,
    pub background: Option<Rgba<u8>>,
    pub padding: u32,
}

impl TextStyle {
    pub fn plain(size: f32, color: Rgba<u8>) -> Self {
        Self {
            size,
            color,
            align: Align::Left,
            outline_width: 0,
            outline_color: Rgba([0, 0, 0, 255]),
            background: None,
            padding: 0,
        }
    }
}

/// Measured block of lines.
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<(String, f32)>,
    pub width: f32,
    pub line_height: f32,
}

impl TextBlock {
    pub fn layout(fonts: &FontBook, lines: &[String], size: f32) -> Self {
        let measured: Vec<(String, f32)> = lines
            .iter()
            .map(|l| (l.clone(), fonts.measure(l, size)))
            .collect();
        let width = measured.iter().map(|(_, w)| *w).fold(0.0, f32::max);
        Self {
            lines: measured,
            width,
            line_height: fonts.line_height(size),
        }
    }

    pub fn height(&self) -> f32 {
        let n = self.lines.len() as f32;
        if n == 0.0 {
            return 0.0;
        }
        n * self.line_height + (n - 1.0) * LINE_SPACING
    }

    /// Draw with the block's top-left corner at `(x, y)`.
    ///
    /// The background box (if any) goes down first, then the outline by
    /// offset stamping, then the fill.
    pub fn draw(&self, fonts: &FontBook, img: &mut RgbaImage, x: f32, y: f32, style: &TextStyle) {
        if let Some(bg) = style.background {
            let pad = style.padding as f32;
            fill_rounded_rect(
                img,
                (x - pad).round() as i32,
                (y - pad).round() as i32,
                (self.width + 2.0 * pad).round() as u32,
                (self.height() + 2.0 * pad).round() as u32,
                style.padding.max(8),
                bg,
            );
        }

        let w = style.outline_width as i32;
        let offsets: Vec<(i32, i32)> = (-w..=w)
            .flat_map(|dx| (-w..=w).map(move |dy| (dx, dy)))
            .filter(|&(dx, dy)| (dx, dy) != (0, 0) && dx * dx + dy * dy <= w * w)
            .collect();

        for &(dx, dy) in &offsets {
            self.draw_lines(fonts, img, x + dx as f32, y + dy as f32, style, style.outline_color);
        }
        self.draw_lines(fonts, img, x, y, style, style.color);
    }

    fn draw_lines(
        &self,
        fonts: &FontBook,
        img: &mut RgbaImage,
        x: f32,
        y: f32,
        style: &TextStyle,
        color: Rgba<u8>,
    ) {
        let mut cursor_y = y;
        for (line, width) in &self.lines {
            let lx = match style.align {
                Align::Left => x,
                Align::Center => x + (self.width - width) / 2.0,
                Align::Right => x + self.width - width,
            };
            fonts.draw_line(img, line, lx, cursor_y, style.size, color);
            cursor_y += self.line_height + LINE_SPACING;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mono(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn test_wrap_breaks_before_overflowing_word() {
        let lines = wrap_lines("aaa bbb ccc ddd", 75.0, 10, mono);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_wrap_respects_max_lines() {
        let lines = wrap_lines("one two three four five six", 40.0, 2, mono);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_wrap_emits_long_word_once() {
        let lines = wrap_lines("hi supercalifragilistic ok", 50.0, 5, mono);
        assert_eq!(lines, vec!["hi", "supercalifragilistic", "ok"]);
    }

    #[test]
    fn test_wrap_honours_newlines_and_empty_input() {
        assert!(wrap_lines("", 100.0, 3, mono).is_empty());
        assert!(wrap_lines("text", 100.0, 0, mono).is_empty());
        let lines = wrap_lines("first\nsecond line", 200.0, 5, mono);
        assert_eq!(lines, vec!["first", "second line"]);
    }

    #[test]
    fn test_builtin_font_measures_and_draws() {
        let fonts = FontBook::builtin().unwrap();
        assert!(fonts.source().is_none());
        let wide = fonts.measure("WWWW", 40.0);
        let narrow = fonts.measure("iiii", 40.0);
        assert!(wide > narrow && narrow > 0.0);
        assert!(fonts.line_height(40.0) > 30.0);

        let mut img = RgbaImage::new(200, 60);
        fonts.draw_line(&mut img, "Hello", 4.0, 4.0, 40.0, Rgba([255, 255, 255, 255]));
        assert!(img.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_resolve_skips_missing_candidates() {
        let config = FontConfig {
            preferred: Some(PathBuf::from("/nonexistent/font.ttf")),
            fallbacks: vec![PathBuf::from("/also/missing.ttf")],
        };
        let fonts = FontBook::resolve(&config).unwrap();
        assert!(fonts.source().is_none());
    }

    #[test]
    fn test_block_background_drawn_behind_text() {
        let fonts = FontBook::builtin().unwrap();
        let block = TextBlock::layout(&fonts, &["Sale".to_string()], 32.0);
        let mut img = RgbaImage::new(200, 100);
        let style = TextStyle {
            background: Some(Rgba([0, 0, 255, 255])),
            padding: 10,
            ..TextStyle::plain(32.0, Rgba([255, 255, 255, 255]))
        };
        block.draw(&fonts, &mut img, 20.0, 20.0, &style);
        assert_eq!(*img.get_pixel(15, 40), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_huge_background_padding_covers_image() {
        let fonts = FontBook::builtin().unwrap();
        let block = TextBlock::layout(&fonts, &["Sale".to_string()], 32.0);
        let mut img = RgbaImage::new(200, 100);
        let style = TextStyle {
            background: Some(Rgba([0, 0, 255, 255])),
            padding: 2_000_000_000,
            ..TextStyle::plain(32.0, Rgba([255, 255, 255, 255]))
        };
        block.draw(&fonts, &mut img, 0.0, 0.0, &style);
        assert_eq!(*img.get_pixel(199, 99), Rgba([0, 0, 255, 255]));
    }

    proptest! {
        #[test]
        fn prop_wrapped_lines_fit_or_are_single_words(
            words in proptest::collection::vec("[a-z]{1,12}", 0..30),
            max_width in 20.0f32..200.0,
        ) {
            let text = words.join(" ");
            for line in wrap_lines(&text, max_width, 100, mono) {
                prop_assert!(mono(&line) <= max_width || !line.contains(' '));
            }
        }

        #[test]
        fn prop_wrap_keeps_word_order(words in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
            let text = words.join(" ");
            let lines = wrap_lines(&text, 60.0, 100, mono);
            let rejoined: Vec<String> = lines
                .iter()
                .flat_map(|l| l.split(' ').map(str::to_string))
                .collect();
            prop_assert_eq!(rejoined, words);
        }
    }
}
