//! Whole-page extraction over storefront-shaped HTML.

use reelforge_extract::{ProductExtractor, Site};

const JSON_LD_PAGE: &str = r#"<!doctype html>
<html><head>
<title>Lumo Store - Desk Lamp</title>
<meta property="og:title" content="Lumo Desk Lamp (og)">
<script type="application/ld+json">
{
  "@context": "https://schema.org",
  "@type": "Product",
  "name": "Lumo Desk Lamp",
  "image": ["/media/lamp-front.jpg", {"url": "https://cdn.lumo.example/lamp-side.jpg"}],
  "offers": {"@type": "Offer", "price": 24.5, "priceCurrency": "USD"}
}
</script>
</head><body>
<h1>Lumo Desk Lamp</h1>
<div class="product-description"><ul>
  <li>Three colour temperatures</li>
  <li>Three colour temperatures</li>
  <li>USB-C powered</li>
  <li>ok</li>
</ul></div>
<img src="/static/logo.svg">
</body></html>"#;

const COUPANG_PAGE: &str = r#"<html><head>
<title>쿠팡!</title>
<meta property="og:image" content="//thumbnail.coupangcdn.com/a.jpg">
<meta property="og:image" content="//thumbnail.coupangcdn.com/a.jpg">
<meta property="og:description" content="무선 충전 지원 • 최대 20시간 사용">
</head><body>
<h2 class="prod-buy-header__title">휴대용 무선 선풍기</h2>
<span class="total-price"><strong>29,900원</strong></span>
</body></html>"#;

#[test]
fn test_json_ld_product_page() {
    let info = ProductExtractor::new()
        .extract(JSON_LD_PAGE, Some("https://lumo.example/p/lamp"))
        .unwrap();
    assert_eq!(info.site, Site::Generic);
    assert_eq!(info.title, "Lumo Desk Lamp");
    assert_eq!(info.price.as_deref(), Some("USD 24.5"));
    assert_eq!(
        info.features,
        vec!["Three colour temperatures".to_string(), "USB-C powered".to_string()]
    );
    assert_eq!(
        info.images,
        vec![
            "https://lumo.example/media/lamp-front.jpg".to_string(),
            "https://cdn.lumo.example/lamp-side.jpg".to_string()
        ]
    );
}

#[test]
fn test_coupang_page_into_script() {
    let info = ProductExtractor::new()
        .extract(COUPANG_PAGE, Some("https://www.coupang.com/vp/products/42"))
        .unwrap();
    assert_eq!(info.site, Site::Coupang);
    assert_eq!(info.title, "휴대용 무선 선풍기");
    assert_eq!(info.price.as_deref(), Some("29,900원"));
    assert_eq!(
        info.images,
        vec!["https://thumbnail.coupangcdn.com/a.jpg".to_string()]
    );

    let script = info.into_script(Some("Link in bio".to_string()));
    assert_eq!(
        script.features,
        vec!["무선 충전 지원".to_string(), "최대 20시간 사용".to_string()]
    );
    assert_eq!(script.dynamic_caption(), Some("무선 충전 지원"));
}
