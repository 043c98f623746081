//! Storefront detection from a page URL.

use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Coupang,
    AliExpress,
    #[default]
    Generic,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Coupang => "coupang",
            Site::AliExpress => "aliexpress",
            Site::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which storefront `url` belongs to. Unparseable URLs are generic.
pub fn detect_site(url: &str) -> Site {
    let Some(host) = Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        return Site::Generic;
    };
    if host.contains("coupang.com") {
        Site::Coupang
    } else if ["aliexpress", "ali.com", "alibaba.com"]
        .iter()
        .any(|h| host.contains(h))
    {
        Site::AliExpress
    } else {
        Site::Generic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_site() {
        assert_eq!(detect_site("https://www.coupang.com/vp/products/1"), Site::Coupang);
        assert_eq!(detect_site("https://m.coupang.com/x"), Site::Coupang);
        assert_eq!(detect_site("https://ko.aliexpress.com/item/1.html"), Site::AliExpress);
        assert_eq!(detect_site("https://www.alibaba.com/p"), Site::AliExpress);
        assert_eq!(detect_site("https://shop.example.com/p/1"), Site::Generic);
        assert_eq!(detect_site("not a url"), Site::Generic);
    }

    #[test]
    fn test_site_names() {
        assert_eq!(Site::AliExpress.to_string(), "aliexpress");
        assert_eq!(serde_json::to_value(Site::Coupang).unwrap(), "coupang");
    }
}
