//! Caption and narration source content.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub title: String,
    pub price: Option<String>,
    pub features: Vec<String>,
    pub cta: Option<String>,
}

impl Script {
    /// The single caption line drawn by the overlay.
    ///
    /// First feature wins, then the price. Nothing is drawn when both are empty.
    pub fn dynamic_caption(&self) -> Option<&str> {
        if let Some(first) = self.features.first() {
            if !first.trim().is_empty() {
                return Some(first.as_str());
            }
        }
        self.price
            .as_deref()
            .filter(|price| !price.trim().is_empty())
    }

    /// Text handed to the narration synthesizer.
    pub fn narration_text(&self) -> Option<String> {
        let joined = self
            .features
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return Some(joined);
        }
        let title = self.title.trim();
        (!title.is_empty()).then(|| title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_prefers_first_feature() {
        let script = Script {
            price: Some("$19".to_string()),
            features: vec!["Waterproof".to_string(), "Light".to_string()],
            ..Script::default()
        };
        assert_eq!(script.dynamic_caption(), Some("Waterproof"));
    }

    #[test]
    fn test_caption_falls_back_to_price() {
        let script = Script {
            price: Some("$19".to_string()),
            ..Script::default()
        };
        assert_eq!(script.dynamic_caption(), Some("$19"));
    }

    #[test]
    fn test_no_caption_when_empty() {
        assert_eq!(Script::default().dynamic_caption(), None);
        let script = Script {
            price: Some("  ".to_string()),
            ..Script::default()
        };
        assert_eq!(script.dynamic_caption(), None);
    }

    #[test]
    fn test_narration_uses_features_then_title() {
        let mut script = Script {
            title: "Desk Lamp".to_string(),
            features: vec!["Warm light".to_string(), "USB-C".to_string()],
            ..Script::default()
        };
        assert_eq!(script.narration_text().as_deref(), Some("Warm light USB-C"));
        script.features.clear();
        assert_eq!(script.narration_text().as_deref(), Some("Desk Lamp"));
        script.title.clear();
        assert_eq!(script.narration_text(), None);
    }
}
