//! Parsed page plus the lookups strategies share.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::site::Site;

pub struct Page {
    pub document: Html,
    pub site: Site,
    base: Option<Url>,
    products: Vec<Value>,
}

impl Page {
    pub fn parse(html: &str, base: Option<Url>, site: Site) -> Self {
        let document = Html::parse_document(html);
        let products = json_ld_products(&document);
        Self {
            document,
            site,
            base,
            products,
        }
    }

    /// JSON-LD objects typed `Product` (top level, arrays, or `@graph`).
    pub fn products(&self) -> &[Value] {
        &self.products
    }

    /// `content` of every `<meta property=key>` or `<meta name=key>`.
    pub fn meta_all(&self, key: &str) -> Vec<String> {
        let Ok(sel) = Selector::parse("meta") else {
            return vec![];
        };
        self.document
            .select(&sel)
            .filter(|m| {
                let value = m.value();
                value.attr("property") == Some(key)
                    || value.attr("name") == Some(key)
                    || value.attr("itemprop") == Some(key)
            })
            .filter_map(|m| m.value().attr("content"))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn meta(&self, key: &str) -> Option<String> {
        self.meta_all(key).into_iter().next()
    }

    /// Elements matching `selector`; an invalid selector matches nothing.
    pub fn select<'a>(&'a self, selector: &str) -> Vec<ElementRef<'a>> {
        match Selector::parse(selector) {
            Ok(sel) => self.document.select(&sel).collect(),
            Err(_) => {
                tracing::debug!(selector, "Invalid selector");
                vec![]
            }
        }
    }

    /// Text of the first element matching `selector` that has any.
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.select(selector)
            .into_iter()
            .map(element_text)
            .find(|t| !t.is_empty())
    }

    /// All visible text, one text node per line.
    pub fn visible_text(&self) -> String {
        let skip = ["script", "style", "noscript", "template"];
        self.document
            .root_element()
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent()?.value().as_element()?;
                (!skip.contains(&parent.name())).then(|| text.trim())
            })
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Absolute form of `src`, or `None` when it cannot be resolved.
    pub fn resolve(&self, src: &str) -> Option<String> {
        let src = src.trim();
        if src.is_empty() || src.starts_with("data:") {
            return None;
        }
        let src = if let Some(rest) = src.strip_prefix("//") {
            format!("https://{rest}")
        } else {
            src.to_string()
        };
        match Url::parse(&src) {
            Ok(url) => Some(url.to_string()),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.as_ref()?.join(&src).ok().map(|u| u.to_string())
            }
            Err(_) => None,
        }
    }
}

/// Element text with whitespace collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn json_ld_products(document: &Html) -> Vec<Value> {
    let Ok(sel) = Selector::parse("script[type='application/ld+json']") else {
        return vec![];
    };
    let mut products = vec![];
    for script in document.select(&sel) {
        let text = script.text().collect::<String>();
        match serde_json::from_str::<Value>(text.trim()) {
            Ok(data) => collect_products(&data, &mut products),
            Err(e) => tracing::debug!(error = %e, "Skipping unparseable JSON-LD block"),
        }
    }
    products
}

fn collect_products(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|v| collect_products(v, out)),
        Value::Object(obj) => {
            let is_product = match obj.get("@type") {
                Some(Value::String(t)) => t == "Product" || t == "ProductGroup",
                Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
                _ => false,
            };
            if is_product {
                out.push(value.clone());
            }
            if let Some(graph) = obj.get("@graph") {
                collect_products(graph, out);
            }
        }
        _ => {}
    }
}
