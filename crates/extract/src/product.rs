//! Extraction result and error types.

use serde::Serialize;

use reelforge_project_model::Script;

use crate::site::Site;

/// What a product page yielded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductInfo {
    pub site: Site,
    pub title: String,
    pub price: Option<String>,
    pub features: Vec<String>,
    /// Absolute image URLs, deduplicated, in page order.
    pub images: Vec<String>,
}

impl ProductInfo {
    /// Narration script for this product.
    pub fn into_script(self, cta: Option<String>) -> Script {
        Script {
            title: self.title,
            price: self.price,
            features: self.features,
            cta: cta.filter(|c| !c.trim().is_empty()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Invalid page URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("No product title found in page")]
    MissingTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_script() {
        let info = ProductInfo {
            title: "Lamp".to_string(),
            price: Some("$20".to_string()),
            features: vec!["Warm light".to_string()],
            ..ProductInfo::default()
        };
        let script = info.clone().into_script(Some("Link in bio".to_string()));
        assert_eq!(script.title, "Lamp");
        assert_eq!(script.price.as_deref(), Some("$20"));
        assert_eq!(script.cta.as_deref(), Some("Link in bio"));
        assert_eq!(info.into_script(Some("  ".to_string())).cta, None);
    }
}
