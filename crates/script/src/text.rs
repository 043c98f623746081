//! Narration script copy.

use reelforge_project_model::Script;

/// Placeholder template used when the caller supplies none.
pub const DEFAULT_SCRIPT_TEMPLATE: &str =
    "{title} — the 30-second rundown!\n{features_bullets}\n{price_line}\n{cta}";

const MAX_SCRIPT_FEATURES: usize = 4;
const MAX_REFINED_FEATURES: usize = 5;
const FEATURE_CHARS: std::ops::RangeInclusive<usize> = 6..=120;

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Hook line, up to four bullet features, price line, CTA; one per line.
pub fn generate_script_text(
    title: Option<&str>,
    price: Option<&str>,
    features: &[String],
    cta: Option<&str>,
) -> String {
    let price = non_empty(price);
    let mut lines = vec![];

    if let Some(title) = non_empty(title) {
        lines.push(match price {
            Some(_) => format!("{title} — what a deal!"),
            None => format!("{title} — the 30-second rundown!"),
        });
    }
    lines.extend(
        features
            .iter()
            .take(MAX_SCRIPT_FEATURES)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(|f| format!("• {f}")),
    );
    if let Some(price) = price {
        lines.push(format!("Price: {price}"));
    }
    if let Some(cta) = non_empty(cta) {
        lines.push(cta.to_string());
    }
    lines.join("\n")
}

/// [`generate_script_text`] over a [`Script`].
pub fn script_text(script: &Script) -> String {
    generate_script_text(
        Some(&script.title),
        script.price.as_deref(),
        &script.features,
        script.cta.as_deref(),
    )
}

/// Substitute `{title} {price} {cta} {price_line} {features_bullets}
/// {features_numbers}` in `template`. Unknown braces are left alone.
pub fn render_script_template(template: &str, script: &Script) -> String {
    let features: Vec<&str> = script
        .features
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    let bullets = features
        .iter()
        .map(|f| format!("• {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    let numbers = features
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{}. {f}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let price = non_empty(script.price.as_deref()).unwrap_or_default();
    let price_line = if price.is_empty() {
        String::new()
    } else {
        format!("Price: {price}")
    };

    [
        ("{title}", script.title.as_str()),
        ("{price}", price),
        ("{cta}", script.cta.as_deref().unwrap_or_default()),
        ("{price_line}", price_line.as_str()),
        ("{features_bullets}", bullets.as_str()),
        ("{features_numbers}", numbers.as_str()),
    ]
    .into_iter()
    .fold(template.to_string(), |out, (key, value)| out.replace(key, value))
}

/// Collapse whitespace, keep 6..=120 character features, dedupe, at most five.
pub fn refine_features<S: AsRef<str>>(features: &[S]) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    for feature in features {
        let normalized = feature
            .as_ref()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !FEATURE_CHARS.contains(&normalized.chars().count()) {
            continue;
        }
        if !out.contains(&normalized) {
            out.push(normalized);
        }
        if out.len() >= MAX_REFINED_FEATURES {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_script_text_with_price() {
        let text = generate_script_text(
            Some("Desk Lamp"),
            Some("$19.99"),
            &features(&["Warm light", "", "USB-C", "Foldable", "Dimmable", "Fifth"]),
            Some("Link in bio"),
        );
        assert_eq!(
            text,
            "Desk Lamp — what a deal!\n• Warm light\n• USB-C\n• Foldable\nPrice: $19.99\nLink in bio"
        );
    }

    #[test]
    fn test_script_text_without_price() {
        let text = generate_script_text(Some("Desk Lamp"), Some("  "), &[], None);
        assert_eq!(text, "Desk Lamp — the 30-second rundown!");
        assert_eq!(generate_script_text(None, None, &[], None), "");
    }

    #[test]
    fn test_template_placeholders() {
        let script = Script {
            title: "Lamp".to_string(),
            price: Some("$5".to_string()),
            features: features(&["Bright", "Small"]),
            cta: Some("Buy".to_string()),
        };
        let out = render_script_template(
            "{title}|{price}|{price_line}|{cta}\n{features_bullets}\n{features_numbers}|{other}",
            &script,
        );
        assert_eq!(out, "Lamp|$5|Price: $5|Buy\n• Bright\n• Small\n1. Bright\n2. Small|{other}");
    }

    #[test]
    fn test_template_without_price_leaves_empty_line() {
        let script = Script {
            title: "Lamp".to_string(),
            ..Script::default()
        };
        let out = render_script_template(DEFAULT_SCRIPT_TEMPLATE, &script);
        assert_eq!(out, "Lamp — the 30-second rundown!\n\n\n");
    }

    #[test]
    fn test_refine_features() {
        let refined = refine_features(&[
            "  Long   battery\tlife ",
            "short",
            "Long battery life",
            "x".repeat(121).as_str(),
            "Water resistant",
            "Two colours",
            "Quick charge",
            "Light weight",
            "Never reached",
        ]);
        assert_eq!(
            refined,
            features(&[
                "Long battery life",
                "Water resistant",
                "Two colours",
                "Quick charge",
                "Light weight"
            ])
        );
    }

    #[test]
    fn test_refine_counts_characters_not_bytes() {
        // Five Hangul syllables are 15 bytes but only 5 characters.
        assert!(refine_features(&["가나다라마"]).is_empty());
        assert_eq!(refine_features(&["가나다라마바"]).len(), 1);
    }
}
