//! Foreign price strings to an approximate KRW figure.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// KRW per unit of each supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeRates {
    pub usd: f64,
    pub eur: f64,
    pub jpy: f64,
    pub cny: f64,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            usd: 1350.0,
            eur: 1450.0,
            jpy: 9.5,
            cny: 190.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Eur,
    Jpy,
    Cny,
}

impl ExchangeRates {
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
            Currency::Jpy => self.jpy,
            Currency::Cny => self.cny,
        }
    }
}

/// Currency named by a leading symbol or a code anywhere in the string.
///
/// A bare `¥` reads as yen; yuan needs `CNY` or `RMB`.
pub fn detect_currency(price: &str) -> Option<Currency> {
    let s = price.trim();
    let upper = s.to_uppercase();
    if s.starts_with('$') || upper.contains("USD") {
        Some(Currency::Usd)
    } else if s.starts_with('€') || upper.contains("EUR") {
        Some(Currency::Eur)
    } else if upper.contains("CNY") || upper.contains("RMB") {
        Some(Currency::Cny)
    } else if s.starts_with('¥') || upper.contains("JPY") {
        Some(Currency::Jpy)
    } else {
        None
    }
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(\.[0-9]+)?").expect("static regex")
    })
}

/// First number in the string, thousands separators removed.
pub fn parse_amount(price: &str) -> Option<f64> {
    let caps = amount_regex().captures(price)?;
    let whole = caps.get(1)?.as_str().replace(',', "");
    let frac = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    format!("{whole}{frac}").parse().ok()
}

/// `1234567` → `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Convert a foreign price to `"≈ 12,345 KRW"`.
///
/// Returns the input unchanged when no currency or amount is recognised.
pub fn convert_price(price: &str, rates: &ExchangeRates) -> String {
    let Some(currency) = detect_currency(price) else {
        return price.to_string();
    };
    let Some(amount) = parse_amount(price) else {
        return price.to_string();
    };
    let rate = rates.rate(currency);
    if !(rate.is_finite() && rate > 0.0) {
        tracing::warn!(?currency, rate, "Ignoring unusable exchange rate");
        return price.to_string();
    }
    let krw = (amount * rate).round().max(0.0) as u64;
    format!("≈ {} KRW", group_thousands(krw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_detect_currency() {
        assert_eq!(detect_currency("$19.99"), Some(Currency::Usd));
        assert_eq!(detect_currency("19.99 usd"), Some(Currency::Usd));
        assert_eq!(detect_currency("€5"), Some(Currency::Eur));
        assert_eq!(detect_currency("¥1,200"), Some(Currency::Jpy));
        assert_eq!(detect_currency("¥88 RMB"), Some(Currency::Cny));
        assert_eq!(detect_currency("12,000원"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("US $1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("€5"), Some(5.0));
        assert_eq!(parse_amount("USD"), None);
    }

    #[test]
    fn test_convert_price() {
        let rates = ExchangeRates::default();
        assert_eq!(convert_price("$20", &rates), "≈ 27,000 KRW");
        assert_eq!(convert_price("EUR 2.50", &rates), "≈ 3,625 KRW");
        assert_eq!(convert_price("¥1,000", &rates), "≈ 9,500 KRW");
        assert_eq!(convert_price("12,000원", &rates), "12,000원");
        assert_eq!(convert_price("$", &rates), "$");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    proptest! {
        #[test]
        fn prop_grouping_roundtrips(value in 0u64..10_000_000_000) {
            let grouped = group_thousands(value);
            prop_assert_eq!(grouped.replace(',', "").parse::<u64>().unwrap(), value);
            prop_assert!(grouped.split(',').skip(1).all(|g| g.len() == 3));
        }
    }
}
