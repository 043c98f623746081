//! Pull a product script out of a saved product page.

use std::path::PathBuf;

use reelforge_extract::ProductExtractor;
use reelforge_project_model::ProjectStore;
use reelforge_script::{convert_price, refine_features, ExchangeRates};

use super::load_project;

pub fn run(
    store: &ProjectStore,
    html: PathBuf,
    url: Option<String>,
    project: Option<String>,
    cta: Option<String>,
    krw: bool,
) -> anyhow::Result<()> {
    let page = std::fs::read_to_string(&html)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", html.display()))?;

    let mut info = ProductExtractor::new()
        .extract(&page, url.as_deref())
        .map_err(|e| anyhow::anyhow!("Extraction failed: {e}"))?;
    info.features = refine_features(&info.features);
    if krw {
        info.price = info
            .price
            .map(|p| convert_price(&p, &ExchangeRates::default()));
    }

    println!("{}", serde_json::to_string_pretty(&info)?);

    let Some(id) = project else {
        return Ok(());
    };
    let mut target = load_project(store, &id)?;
    target.script = info.into_script(cta);
    store
        .save(&mut target)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    println!();
    println!("[OK] Script stored in project {}", target.id);
    if let Some(caption) = target.script.dynamic_caption() {
        println!("  Caption: {caption}");
    }
    Ok(())
}
