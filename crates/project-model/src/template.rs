//! Static overlay template.
//!
//! Every position and size here is an explicit pixel value on the project
//! canvas. The renderer clamps them into bounds; the document itself does
//! not validate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the dynamic caption line is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptionPosition {
    /// Below the title card.
    #[default]
    Middle,
    /// Inside the bottom caption area.
    Bottom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub name: String,

    /// Text in the top colour bar.
    pub header: String,

    /// Title text in the card under the bar.
    pub subheader: String,

    /// Small text anchored bottom-left.
    pub footer: String,

    /// Label of the call-to-action pill.
    pub cta_label: String,

    /// Channel name next to the profile circle.
    pub profile_name: String,

    /// RGB colour of the top bar.
    #[serde(alias = "color")]
    pub theme_color: [u8; 3],

    /// Image drawn inside the profile circle.
    pub avatar_path: Option<PathBuf>,

    /// Draw the title as a rounded badge card instead of a full-width card.
    pub badge: bool,

    /// Draw the translucent rounded caption bar near the bottom.
    pub caption_bar: bool,

    pub caption_position: CaptionPosition,
    pub caption_max_lines: usize,

    /// Darken the bottom of the frame.
    pub bottom_gradient: bool,

    pub bar_height: u32,
    pub card_height: u32,
    pub caption_bar_y: u32,
    pub caption_bar_height: u32,
    pub pill_x: i32,
    pub pill_y: i32,
    pub pill_w: u32,
    pub pill_h: u32,
    pub profile_x: i32,
    pub profile_y_offset: i32,

    pub hdr_size: u32,
    pub title_size: u32,
    pub mid_size: u32,
    pub cta_size: u32,
    pub prof_size: u32,
    pub foot_size: u32,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            name: "Clean".to_string(),
            header: String::new(),
            subheader: String::new(),
            footer: String::new(),
            cta_label: String::new(),
            profile_name: String::new(),
            theme_color: [16, 153, 127],
            avatar_path: None,
            badge: false,
            caption_bar: false,
            caption_position: CaptionPosition::Middle,
            caption_max_lines: 3,
            bottom_gradient: true,
            bar_height: 90,
            card_height: 280,
            caption_bar_y: 1380,
            caption_bar_height: 260,
            pill_x: 24,
            pill_y: 1700,
            pill_w: 200,
            pill_h: 64,
            profile_x: 24,
            profile_y_offset: 18,
            hdr_size: 40,
            title_size: 56,
            mid_size: 54,
            cta_size: 32,
            prof_size: 30,
            foot_size: 28,
        }
    }
}

impl Template {
    /// A blank template carries no text at all and draws no overlay.
    pub fn is_blank(&self) -> bool {
        [
            &self.header,
            &self.subheader,
            &self.footer,
            &self.cta_label,
            &self.profile_name,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_template_is_blank() {
        assert!(Template::default().is_blank());
        let t = Template {
            footer: "@shop".to_string(),
            ..Template::default()
        };
        assert!(!t.is_blank());
    }

    #[test]
    fn test_legacy_color_field_is_accepted() {
        let t: Template =
            serde_json::from_str(r#"{"header": "Deal", "color": [1, 2, 3]}"#).unwrap();
        assert_eq!(t.theme_color, [1, 2, 3]);
        assert_eq!(t.bar_height, 90);
        assert_eq!(t.caption_position, CaptionPosition::Middle);
    }
}
