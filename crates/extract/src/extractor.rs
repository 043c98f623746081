//! Ordered per-field extraction strategies.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::page::{collapse_whitespace, element_text, Page};
use crate::product::{ExtractError, ProductInfo};
use crate::site::{detect_site, Site};

/// A named way of pulling one field out of a page.
pub struct Strategy<T> {
    pub name: &'static str,
    pub run: fn(&Page) -> Option<T>,
}

/// First non-empty result across `strategies`.
fn first_hit<T>(page: &Page, field: &str, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| {
        let found = (strategy.run)(page)?;
        tracing::debug!(field, strategy = strategy.name, "Extraction strategy matched");
        Some(found)
    })
}

const MAX_FEATURES: usize = 5;
const MAX_IMAGES: usize = 8;
const MIN_IMAGE_SIDE: u32 = 100;
const FEATURE_CHARS: std::ops::RangeInclusive<usize> = 6..=120;

const EXCLUDED_IMAGE_PATTERNS: &[&str] = &[
    "logo", "icon", "favicon", "sprite", "loading", "placeholder", "avatar", "badge", "payment",
    "banner", "blank.gif",
];

/// Runs title, price, feature, and image strategies over product HTML.
pub struct ProductExtractor {
    titles: Vec<Strategy<String>>,
    prices: Vec<Strategy<String>>,
    features: Vec<Strategy<Vec<String>>>,
    images: Vec<Strategy<Vec<String>>>,
}

impl Default for ProductExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductExtractor {
    pub fn new() -> Self {
        Self {
            titles: vec![
                Strategy { name: "json-ld-name", run: title_from_json_ld },
                Strategy { name: "og-title", run: title_from_og },
                Strategy { name: "site-selectors", run: title_from_site },
                Strategy { name: "h1", run: title_from_h1 },
                Strategy { name: "title-tag", run: title_from_title_tag },
            ],
            prices: vec![
                Strategy { name: "json-ld-offer", run: price_from_json_ld },
                Strategy { name: "price-meta", run: price_from_meta },
                Strategy { name: "site-selectors", run: price_from_site },
                Strategy { name: "text-regex", run: price_from_text },
            ],
            features: vec![
                Strategy { name: "description-lists", run: features_from_lists },
                Strategy { name: "spec-table", run: features_from_spec_table },
                Strategy { name: "og-description", run: features_from_description },
            ],
            images: vec![
                Strategy { name: "og-image", run: images_from_og },
                Strategy { name: "json-ld-image", run: images_from_json_ld },
                Strategy { name: "img-tags", run: images_from_img_tags },
            ],
        }
    }

    /// Extract from `html`. `url` locates the page for site detection and
    /// relative image links.
    pub fn extract(&self, html: &str, url: Option<&str>) -> Result<ProductInfo, ExtractError> {
        let base = url
            .map(|u| {
                Url::parse(u.trim()).map_err(|source| ExtractError::InvalidUrl {
                    url: u.to_string(),
                    source,
                })
            })
            .transpose()?;
        let site = url.map(detect_site).unwrap_or_default();
        let page = Page::parse(html, base, site);

        let title = first_hit(&page, "title", &self.titles).ok_or(ExtractError::MissingTitle)?;
        let info = ProductInfo {
            site,
            title,
            price: first_hit(&page, "price", &self.prices),
            features: first_hit(&page, "features", &self.features).unwrap_or_default(),
            images: first_hit(&page, "images", &self.images).unwrap_or_default(),
        };
        tracing::info!(
            site = %info.site,
            title = %info.title,
            price = info.price.as_deref().unwrap_or("-"),
            features = info.features.len(),
            images = info.images.len(),
            "Product extracted"
        );
        Ok(info)
    }
}

fn non_empty(text: String) -> Option<String> {
    let text = collapse_whitespace(&text);
    (!text.is_empty()).then_some(text)
}

fn non_empty_list(items: Vec<String>) -> Option<Vec<String>> {
    (!items.is_empty()).then_some(items)
}

fn has_hangul(text: &str) -> bool {
    text.chars().any(|c| ('\u{AC00}'..='\u{D7A3}').contains(&c))
}

// Titles

fn title_from_json_ld(page: &Page) -> Option<String> {
    page.products()
        .iter()
        .find_map(|p| p.get("name")?.as_str().map(str::to_string).and_then(non_empty))
}

fn title_from_og(page: &Page) -> Option<String> {
    page.meta("og:title").and_then(non_empty)
}

fn title_from_site(page: &Page) -> Option<String> {
    let selectors: &[&str] = match page.site {
        Site::Coupang => &[
            "h2.prod-buy-header__title",
            "h1.prod-buy-header__title",
            "div.prod-buy-header__title",
        ],
        Site::AliExpress => &["h1[data-pl='product-title']", "div.product-title-text"],
        Site::Generic => &[],
    };
    let candidates: Vec<String> = selectors
        .iter()
        .filter_map(|sel| page.first_text(sel))
        .collect();
    // Prefer the Korean listing title when several are present.
    let preferred = candidates.iter().find(|t| has_hangul(t)).cloned();
    preferred.or_else(|| candidates.into_iter().next())
}

fn title_from_h1(page: &Page) -> Option<String> {
    page.first_text("h1").filter(|t| t.chars().count() < 200)
}

fn title_from_title_tag(page: &Page) -> Option<String> {
    page.first_text("title")
}

// Prices

fn json_number_or_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn with_currency(amount: String, currency: Option<String>) -> String {
    match currency {
        Some(code) if !amount.chars().any(|c| !(c.is_ascii_digit() || c == '.' || c == ',')) => {
            format!("{code} {amount}")
        }
        _ => amount,
    }
}

fn price_from_json_ld(page: &Page) -> Option<String> {
    page.products().iter().find_map(|product| {
        let offers = product.get("offers")?;
        let offer = match offers {
            Value::Array(items) => items.first()?,
            other => other,
        };
        let amount = offer
            .get("price")
            .or_else(|| offer.get("lowPrice"))
            .and_then(json_number_or_string)?;
        let currency = offer
            .get("priceCurrency")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(with_currency(amount, currency))
    })
}

fn price_from_meta(page: &Page) -> Option<String> {
    let amount = ["product:price:amount", "og:product:price:amount", "og:price:amount", "price"]
        .iter()
        .find_map(|key| page.meta(key))?;
    let currency = ["product:price:currency", "og:price:currency", "priceCurrency"]
        .iter()
        .find_map(|key| page.meta(key));
    Some(with_currency(amount, currency))
}

fn price_from_site(page: &Page) -> Option<String> {
    let selectors: &[&str] = match page.site {
        Site::Coupang => &[
            "span.total-price > strong",
            "span.total-price",
            "span.prod-sale-price > strong",
            "span.prod-price__price",
        ],
        Site::AliExpress => &["div.product-price-current", "span.product-price-value"],
        Site::Generic => &["[itemprop='price']", "[class*='price']"],
    };
    selectors
        .iter()
        .filter_map(|sel| page.first_text(sel))
        .find(|text| price_regex().is_match(text))
}

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"[$€¥₩£]\s*[0-9]{1,3}(?:,[0-9]{3})*(?:\.[0-9]+)?|[0-9]{1,3}(?:,[0-9]{3})+\s*원|[0-9]+(?:\.[0-9]+)?\s*(?:USD|EUR|JPY|CNY|KRW)",
        )
        .expect("static regex")
    })
}

fn price_from_text(page: &Page) -> Option<String> {
    let text = page.visible_text();
    price_regex()
        .find(&text)
        .map(|m| collapse_whitespace(m.as_str()))
}

// Features

fn keep_features<I: IntoIterator<Item = String>>(candidates: I) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|c| collapse_whitespace(&c))
        .filter(|c| FEATURE_CHARS.contains(&c.chars().count()))
        .filter(|c| seen.insert(c.clone()))
        .take(MAX_FEATURES)
        .collect()
}

fn features_from_lists(page: &Page) -> Option<Vec<String>> {
    let selectors = [
        "li.prod-description-attribute__item",
        "ul.prod-description-attribute li",
        "[class*='description'] li",
        "[id*='description'] li",
        "[class*='spec'] li",
        "[class*='feature'] li",
        "[itemprop='description'] li",
    ];
    let candidates = selectors
        .iter()
        .flat_map(|sel| page.select(sel))
        .map(element_text);
    non_empty_list(keep_features(candidates))
}

fn features_from_spec_table(page: &Page) -> Option<Vec<String>> {
    let rows = page.select("table tr").into_iter().filter_map(|row| {
        let cells: Vec<String> = row
            .children()
            .filter_map(scraper::ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "th" | "td"))
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        match cells.as_slice() {
            [key, value] => Some(format!("{key}: {value}")),
            [single] => Some(single.clone()),
            _ => None,
        }
    });
    non_empty_list(keep_features(rows))
}

fn features_from_description(page: &Page) -> Option<Vec<String>> {
    static SPLIT: OnceLock<Regex> = OnceLock::new();
    let split = SPLIT.get_or_init(|| Regex::new(r"[•\n|]+|\.\s+|\.$").expect("static regex"));
    let description = page
        .meta("og:description")
        .or_else(|| page.meta("description"))?;
    let chunks = split
        .split(&description)
        .map(|c| c.trim().to_string())
        .collect::<Vec<_>>();
    non_empty_list(keep_features(chunks))
}

// Images

fn keep_images<I: IntoIterator<Item = String>>(page: &Page, candidates: I) -> Option<Vec<String>> {
    let mut seen = HashSet::new();
    let images: Vec<String> = candidates
        .into_iter()
        .filter_map(|src| page.resolve(&src))
        .filter(|src| {
            let lower = src.to_lowercase();
            !EXCLUDED_IMAGE_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .filter(|src| seen.insert(src.clone()))
        .take(MAX_IMAGES)
        .collect();
    non_empty_list(images)
}

fn images_from_og(page: &Page) -> Option<Vec<String>> {
    keep_images(page, page.meta_all("og:image"))
}

fn json_ld_image_urls(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| json_ld_image_urls(v, out)),
        Value::Object(obj) => {
            if let Some(url) = obj.get("url").or_else(|| obj.get("contentUrl")) {
                json_ld_image_urls(url, out);
            }
        }
        _ => {}
    }
}

fn images_from_json_ld(page: &Page) -> Option<Vec<String>> {
    let mut urls = vec![];
    for product in page.products() {
        if let Some(image) = product.get("image") {
            json_ld_image_urls(image, &mut urls);
        }
    }
    keep_images(page, urls)
}

fn attr_px(value: Option<&str>) -> Option<u32> {
    value?.trim().trim_end_matches("px").parse().ok()
}

fn images_from_img_tags(page: &Page) -> Option<Vec<String>> {
    let sources = page.select("img").into_iter().filter_map(|img| {
        let value = img.value();
        let small = [attr_px(value.attr("width")), attr_px(value.attr("height"))]
            .iter()
            .any(|side| matches!(side, Some(px) if *px < MIN_IMAGE_SIDE));
        if small {
            return None;
        }
        value
            .attr("data-src")
            .or_else(|| value.attr("data-img-src"))
            .or_else(|| value.attr("data-lazy-src"))
            .or_else(|| value.attr("src"))
            .map(str::to_string)
    });
    keep_images(page, sources.collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str, url: Option<&str>) -> ProductInfo {
        ProductExtractor::new().extract(html, url).unwrap()
    }

    #[test]
    fn test_title_order() {
        let html = r#"<html><head><title>Store | Lamp</title>
            <meta property="og:title" content="OG Lamp"></head>
            <body><h1>Heading Lamp</h1></body></html>"#;
        assert_eq!(extract(html, None).title, "OG Lamp");
        let html = r#"<html><head><title>Store | Lamp</title></head><body><h1>Heading Lamp</h1></body></html>"#;
        assert_eq!(extract(html, None).title, "Heading Lamp");
        let html = r#"<html><head><title>Store | Lamp</title></head><body></body></html>"#;
        assert_eq!(extract(html, None).title, "Store | Lamp");
    }

    #[test]
    fn test_missing_title_is_error() {
        let result = ProductExtractor::new().extract("<html><body><p>x</p></body></html>", None);
        assert!(matches!(result, Err(ExtractError::MissingTitle)));
    }

    #[test]
    fn test_invalid_url_is_error() {
        let result = ProductExtractor::new().extract("<title>x</title>", Some("::nope"));
        assert!(matches!(result, Err(ExtractError::InvalidUrl { .. })));
    }

    #[test]
    fn test_price_meta_with_currency() {
        let html = r#"<html><head><title>Lamp</title>
            <meta property="product:price:amount" content="19.99">
            <meta property="product:price:currency" content="USD"></head></html>"#;
        assert_eq!(extract(html, None).price.as_deref(), Some("USD 19.99"));
    }

    #[test]
    fn test_price_from_visible_text() {
        let html = r#"<html><head><title>Lamp</title></head>
            <body><script>var p = "$1.00";</script><div>Only 12,900원 today</div></body></html>"#;
        assert_eq!(extract(html, None).price.as_deref(), Some("12,900원"));
    }

    #[test]
    fn test_spec_table_rows() {
        let html = r#"<html><head><title>Lamp</title></head><body><table>
            <tr><th>Material</th><td>Aluminium</td></tr>
            <tr><th>Power</th><td>5 W</td></tr>
            <tr><td>a</td><td>b</td><td>c</td></tr>
            </table></body></html>"#;
        assert_eq!(
            extract(html, None).features,
            vec!["Material: Aluminium".to_string(), "Power: 5 W".to_string()]
        );
    }

    #[test]
    fn test_description_fallback_splits_sentences() {
        let html = r#"<html><head><title>Lamp</title>
            <meta property="og:description" content="Warm dimmable light. USB-C powered • Fits any desk | ok"></head></html>"#;
        assert_eq!(
            extract(html, None).features,
            vec![
                "Warm dimmable light".to_string(),
                "USB-C powered".to_string(),
                "Fits any desk".to_string()
            ]
        );
    }

    #[test]
    fn test_small_and_decorative_images_dropped() {
        let html = r#"<html><head><title>Lamp</title></head><body>
            <img src="/img/logo.png">
            <img src="/img/thumb.jpg" width="50" height="50">
            <img data-src="/img/main.jpg" src="/img/blank.gif" width="800" height="800">
            <img src="/img/main.jpg">
            </body></html>"#;
        assert_eq!(
            extract(html, Some("https://shop.example.com/p/1")).images,
            vec!["https://shop.example.com/img/main.jpg".to_string()]
        );
    }

    #[test]
    fn test_coupang_prefers_korean_title() {
        let html = r#"<html><head><title>Coupang</title></head><body>
            <h2 class="prod-buy-header__title">Desk Lamp</h2>
            <h1 class="prod-buy-header__title">무선 스탠드 조명</h1>
            </body></html>"#;
        let info = extract(html, Some("https://www.coupang.com/vp/products/1"));
        assert_eq!(info.site, Site::Coupang);
        assert_eq!(info.title, "무선 스탠드 조명");
    }
}
