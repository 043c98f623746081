//! Static template overlay.
//!
//! The overlay depends only on the template, the script, and the canvas
//! size. It is drawn once per render and blended over every frame.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use reelforge_project_model::{CaptionPosition, Script, Template};

use crate::geometry::clamp_into;
use crate::paint::{bottom_gradient, fill_circle, fill_rect, fill_rounded_rect};
use crate::text::{wrap_lines, Align, FontBook, TextBlock, TextStyle};

const AVATAR_SIZE: u32 = 56;
const GRADIENT_HEIGHT: u32 = 360;
const GRADIENT_ALPHA: u8 = 180;
const PILL_RADIUS: u32 = 28;
const DEFAULT_CTA: &str = "Shop now";
const DEFAULT_PROFILE: &str = "@channel";
const SUBSCRIBE_LABEL: &str = "Subscribe";

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CARD: Rgba<u8> = Rgba([255, 255, 255, 235]);
const INK: Rgba<u8> = Rgba([16, 16, 16, 255]);

/// Draw the overlay for `template`, or `None` when the template is blank.
pub fn render_overlay(
    template: &Template,
    script: &Script,
    width: u32,
    height: u32,
    fonts: &FontBook,
) -> Option<RgbaImage> {
    if template.is_blank() {
        return None;
    }
    let mut canvas = OverlayCanvas {
        img: RgbaImage::new(width, height),
        fonts,
        w: width as i64,
        h: height as i64,
    };

    let bar_h = canvas.top_bar(template);
    let card_h = canvas.title_card(template, bar_h);
    if template.bottom_gradient {
        bottom_gradient(&mut canvas.img, GRADIENT_HEIGHT, GRADIENT_ALPHA);
    }
    let caption_area = canvas.caption_bar(template);
    if let Some(caption) = script.dynamic_caption() {
        canvas.dynamic_caption(template, caption, bar_h + card_h, caption_area);
    }
    let (pill_y, pill_h) = canvas.cta_pill(template);
    canvas.profile(template, pill_y + pill_h);
    canvas.footer(template);

    Some(canvas.img)
}

struct OverlayCanvas<'a> {
    img: RgbaImage,
    fonts: &'a FontBook,
    w: i64,
    h: i64,
}

impl OverlayCanvas<'_> {
    fn block(&self, lines: &[String], size: f32) -> TextBlock {
        TextBlock::layout(self.fonts, lines, size)
    }

    fn wrap(&self, text: &str, size: f32, max_width: f32, max_lines: usize) -> Vec<String> {
        wrap_lines(text, max_width, max_lines, |s| self.fonts.measure(s, size))
    }

    /// Coloured bar across the top with the header text. Returns the bar height.
    fn top_bar(&mut self, template: &Template) -> i64 {
        let bar_h = clamp_into(template.bar_height as i64, 40, (self.h / 4).max(40));
        let [r, g, b] = template.theme_color;
        fill_rect(&mut self.img, 0, 0, self.w as u32, bar_h as u32, Rgba([r, g, b, 230]));

        let header = template.header.trim();
        if !header.is_empty() {
            let size = template.hdr_size.max(16) as f32;
            let block = self.block(&[header.to_string()], size);
            let y = (bar_h as f32 - block.line_height) / 2.0;
            block.draw(self.fonts, &mut self.img, 24.0, y, &TextStyle::plain(size, WHITE));
        }
        bar_h
    }

    /// White title area under the bar. Returns the card height.
    fn title_card(&mut self, template: &Template, bar_h: i64) -> i64 {
        let card_h = clamp_into(template.card_height as i64, 120, (self.h / 2).max(120));
        let size = template.title_size.max(18) as f32;
        let subheader = template.subheader.trim();

        if template.badge {
            let card_y = bar_h + 24;
            let inner_h = (card_h - 48).max(60);
            fill_rounded_rect(
                &mut self.img,
                40,
                card_y as i32,
                (self.w - 80).max(1) as u32,
                inner_h as u32,
                PILL_RADIUS,
                CARD,
            );
            if !subheader.is_empty() {
                let lines = self.wrap(subheader, size, (self.w - 160) as f32, 2);
                let block = self.block(&lines, size);
                let x = (self.w as f32 - block.width) / 2.0;
                let y = card_y as f32 + (inner_h as f32 - block.height()) / 2.0;
                block.draw(self.fonts, &mut self.img, x, y, &centered(size, Rgba([0, 0, 0, 255])));
            }
        } else {
            fill_rect(&mut self.img, 0, bar_h as i32, self.w as u32, card_h as u32, CARD);
            if !subheader.is_empty() {
                let lines = self.wrap(subheader, size, (self.w - 120) as f32, 3);
                let block = self.block(&lines, size);
                let x = (self.w as f32 - block.width) / 2.0;
                block.draw(
                    self.fonts,
                    &mut self.img,
                    x,
                    (bar_h + 26) as f32,
                    &centered(size, Rgba([0, 0, 0, 255])),
                );

                let divider_y = (bar_h + card_h - 10) as i32;
                draw_filled_rect_mut(
                    &mut self.img,
                    Rect::at(60, divider_y).of_size((self.w - 120).max(1) as u32, 2),
                    Rgba([60, 60, 60, 255]),
                );
            }
        }
        card_h
    }

    /// Optional translucent bar near the bottom. Returns its `(y, height)`.
    fn caption_bar(&mut self, template: &Template) -> Option<(i64, i64)> {
        if !template.caption_bar {
            return None;
        }
        let bar_h = clamp_into(template.caption_bar_height as i64, 40, self.h / 2);
        let y = clamp_into(template.caption_bar_y as i64, 0, self.h - bar_h);
        fill_rounded_rect(
            &mut self.img,
            32,
            y as i32,
            (self.w - 64).max(1) as u32,
            bar_h as u32,
            PILL_RADIUS,
            Rgba([0, 0, 0, 150]),
        );
        Some((y, bar_h))
    }

    fn dynamic_caption(
        &mut self,
        template: &Template,
        caption: &str,
        card_bottom: i64,
        caption_area: Option<(i64, i64)>,
    ) {
        let size = template.mid_size.max(18) as f32;
        let lines = self.wrap(
            caption,
            size,
            (self.w - 140) as f32,
            template.caption_max_lines.max(1),
        );
        let block = self.block(&lines, size);
        let x = (self.w as f32 - block.width) / 2.0;

        let (y, color) = match template.caption_position {
            CaptionPosition::Middle => ((card_bottom + 60) as f32, Rgba([20, 20, 20, 255])),
            CaptionPosition::Bottom => {
                let (area_y, area_h) = caption_area.unwrap_or_else(|| {
                    let area_h = clamp_into(template.caption_bar_height as i64, 40, self.h / 2);
                    (
                        clamp_into(template.caption_bar_y as i64, 0, self.h - area_h),
                        area_h,
                    )
                });
                let y = area_y as f32 + (area_h as f32 - block.height()) / 2.0;
                (y.max(area_y as f32), Rgba([245, 245, 245, 255]))
            }
        };
        block.draw(self.fonts, &mut self.img, x, y, &centered(size, color));
    }

    /// Call-to-action pill. Returns its clamped `(y, height)`.
    fn cta_pill(&mut self, template: &Template) -> (i64, i64) {
        let (max_w, max_h) = ((self.w - 16).max(1), (self.h - 16).max(1));
        let pill_w = clamp_into(template.pill_w as i64, 120.min(max_w), max_w);
        let pill_h = clamp_into(template.pill_h as i64, 40.min(max_h), max_h);
        let pill_x = clamp_into(template.pill_x as i64, 8, self.w - pill_w - 8);
        let pill_y = clamp_into(template.pill_y as i64, 8, self.h - pill_h - 8);
        fill_rounded_rect(
            &mut self.img,
            pill_x as i32,
            pill_y as i32,
            pill_w as u32,
            pill_h as u32,
            PILL_RADIUS,
            CARD,
        );

        let label = non_empty(&template.cta_label).unwrap_or(DEFAULT_CTA);
        let size = template.cta_size.max(14) as f32;
        let block = self.block(&[label.to_string()], size);
        let x = pill_x as f32 + (pill_w as f32 - block.width) / 2.0;
        let y = pill_y as f32 + (pill_h as f32 - block.line_height) / 2.0;
        block.draw(self.fonts, &mut self.img, x, y, &TextStyle::plain(size, INK));
        (pill_y, pill_h)
    }

    /// Avatar circle, channel name, and subscribe chip under the pill.
    fn profile(&mut self, template: &Template, pill_bottom: i64) {
        let avatar = AVATAR_SIZE as i64;
        let x = clamp_into(template.profile_x as i64, 8, self.w - avatar - 8);
        let y = clamp_into(
            pill_bottom + template.profile_y_offset as i64,
            8,
            self.h - avatar - 8,
        );

        if !self.paste_avatar(template, x, y) {
            let r = AVATAR_SIZE as i32 / 2;
            fill_circle(
                &mut self.img,
                x as i32 + r,
                y as i32 + r,
                r,
                Rgba([230, 230, 230, 255]),
            );
        }

        let name = non_empty(&template.profile_name).unwrap_or(DEFAULT_PROFILE);
        let size = template.prof_size.max(12) as f32;
        let block = self.block(&[name.to_string()], size);
        let name_x = (x + avatar + 12) as f32;
        block.draw(
            self.fonts,
            &mut self.img,
            name_x,
            (y + 13) as f32,
            &TextStyle::plain(size, WHITE),
        );

        let chip_size = (template.cta_size as f32 - 6.0).max(12.0);
        let chip = self.block(&[SUBSCRIBE_LABEL.to_string()], chip_size);
        let chip_w = (chip.width + 24.0).max(96.0).min((self.w - 16).max(1) as f32);
        let chip_h = 44.0_f32.min((self.h - 16).max(1) as f32);
        let chip_x = clamp_into(
            (name_x + block.width + 12.0) as i64,
            8,
            self.w - chip_w as i64 - 8,
        ) as f32;
        let chip_y = clamp_into(y + 6, 8, self.h - chip_h as i64 - 8) as f32;
        fill_rounded_rect(
            &mut self.img,
            chip_x as i32,
            chip_y as i32,
            chip_w as u32,
            chip_h as u32,
            20,
            CARD,
        );
        chip.draw(
            self.fonts,
            &mut self.img,
            chip_x + (chip_w - chip.width) / 2.0,
            chip_y + (chip_h - chip.line_height) / 2.0,
            &TextStyle::plain(chip_size, INK),
        );
    }

    /// Circular-masked avatar image. Returns false when it could not be drawn.
    fn paste_avatar(&mut self, template: &Template, x: i64, y: i64) -> bool {
        let Some(path) = template.avatar_path.as_ref().filter(|p| p.exists()) else {
            return false;
        };
        let avatar = match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load avatar");
                return false;
            }
        };
        let avatar = image::imageops::resize(&avatar, AVATAR_SIZE, AVATAR_SIZE, FilterType::Lanczos3);
        let r = AVATAR_SIZE as f32 / 2.0;
        for (ax, ay, p) in avatar.enumerate_pixels() {
            let (dx, dy) = (ax as f32 + 0.5 - r, ay as f32 + 0.5 - r);
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let (px, py) = (x + ax as i64, y + ay as i64);
            if px >= 0 && py >= 0 && px < self.w && py < self.h {
                self.img.put_pixel(px as u32, py as u32, Rgba([p[0], p[1], p[2], 255]));
            }
        }
        true
    }

    fn footer(&mut self, template: &Template) {
        let footer = template.footer.trim();
        if footer.is_empty() {
            return;
        }
        let size = template.foot_size.max(12) as f32;
        let block = self.block(&[footer.to_string()], size);
        let y = self.h as f32 - 36.0 - block.line_height;
        block.draw(
            self.fonts,
            &mut self.img,
            24.0,
            y,
            &TextStyle::plain(size, Rgba([230, 230, 230, 255])),
        );
    }
}

fn centered(size: f32, color: Rgba<u8>) -> TextStyle {
    TextStyle {
        align: Align::Center,
        ..TextStyle::plain(size, color)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts() -> FontBook {
        FontBook::builtin().unwrap()
    }

    fn template() -> Template {
        Template {
            header: "HOT DEAL".to_string(),
            subheader: "Portable blender with a very long product title".to_string(),
            footer: "@shop".to_string(),
            ..Template::default()
        }
    }

    #[test]
    fn test_blank_template_draws_nothing() {
        let out = render_overlay(&Template::default(), &Script::default(), 1080, 1920, &fonts());
        assert!(out.is_none());
    }

    #[test]
    fn test_top_bar_uses_theme_colour() {
        let tpl = Template {
            theme_color: [200, 10, 10],
            ..template()
        };
        let img = render_overlay(&tpl, &Script::default(), 1080, 1920, &fonts()).unwrap();
        assert_eq!(img.dimensions(), (1080, 1920));
        let p = img.get_pixel(1070, 5);
        assert_eq!(&p.0[..3], &[200, 10, 10]);
        assert_eq!(p[3], 230);
    }

    #[test]
    fn test_full_card_covers_width_and_badge_does_not() {
        let img = render_overlay(&template(), &Script::default(), 1080, 1920, &fonts()).unwrap();
        assert_eq!(img.get_pixel(2, 100)[3], 235);

        let badge = Template {
            badge: true,
            ..template()
        };
        let img = render_overlay(&badge, &Script::default(), 1080, 1920, &fonts()).unwrap();
        assert_eq!(img.get_pixel(2, 100)[3], 0);
        assert_eq!(img.get_pixel(540, 120)[3], 235);
    }

    #[test]
    fn test_pill_clamped_inside_canvas() {
        let tpl = Template {
            pill_x: 5000,
            pill_y: 900,
            ..template()
        };
        let img = render_overlay(&tpl, &Script::default(), 1080, 1920, &fonts()).unwrap();
        // Clamped pill spans x in [872, 1072).
        assert!(img.get_pixel(1060, 932)[3] > 0);
        assert_eq!(img.get_pixel(1076, 932)[3], 0);
    }

    /// Dark label pixels in rows `y0..y1` inside the canvas.
    fn ink_pixels(img: &RgbaImage, y0: u32, y1: u32) -> usize {
        (y0..y1)
            .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                let p = img.get_pixel(x, y);
                p[0] < 60 && p[3] == 255
            })
            .count()
    }

    #[test]
    fn test_oversized_pill_is_capped_to_canvas() {
        let tpl = Template {
            cta_label: "Buy".to_string(),
            pill_w: 4000,
            bottom_gradient: false,
            ..template()
        };
        let img = render_overlay(&tpl, &Script::default(), 1080, 1920, &fonts()).unwrap();
        // Pill spans x in [8, 1072) and rows [1700, 1764).
        assert!(img.get_pixel(1060, 1730)[3] > 0);
        assert_eq!(img.get_pixel(1076, 1730)[3], 0);
        assert!(ink_pixels(&img, 1700, 1764) > 0);
    }

    #[test]
    fn test_huge_pill_size_does_not_overflow() {
        let tpl = Template {
            pill_w: i32::MAX as u32,
            pill_h: u32::MAX,
            ..template()
        };
        let img = render_overlay(&tpl, &Script::default(), 1080, 1920, &fonts()).unwrap();
        assert_eq!(img.dimensions(), (1080, 1920));
    }

    #[test]
    fn test_subscribe_chip_stays_on_canvas_after_long_name() {
        let tpl = Template {
            profile_name: "a very long channel name that runs across the canvas".repeat(3),
            bottom_gradient: false,
            ..template()
        };
        let img = render_overlay(&tpl, &Script::default(), 1080, 1920, &fonts()).unwrap();
        // Chip rows sit between the pill and the footer.
        assert!(ink_pixels(&img, 1788, 1832) > 0);
    }

    #[test]
    fn test_bottom_caption_lands_in_caption_bar() {
        let tpl = Template {
            caption_bar: true,
            caption_position: CaptionPosition::Bottom,
            bottom_gradient: false,
            ..template()
        };
        let script = Script {
            features: vec!["Blends in ten seconds".to_string()],
            ..Script::default()
        };
        let img = render_overlay(&tpl, &script, 1080, 1920, &fonts()).unwrap();
        let band = (tpl.caption_bar_y..tpl.caption_bar_y + tpl.caption_bar_height)
            .flat_map(|y| (100..980).map(move |x| (x, y)));
        let bright = band
            .filter(|&(x, y)| {
                let p = img.get_pixel(x, y);
                p[0] > 200 && p[3] > 200
            })
            .count();
        assert!(bright > 0);
    }

    #[test]
    fn test_small_canvas_does_not_panic() {
        let img = render_overlay(&template(), &Script::default(), 64, 112, &fonts()).unwrap();
        assert_eq!(img.dimensions(), (64, 112));
    }
}
