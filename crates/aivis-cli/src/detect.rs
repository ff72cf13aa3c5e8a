//! `aivis-cli detect` — offline detection over a local text file.

use std::path::Path;

use aivis_detector::{detect, parse_answer};

pub(crate) fn execute(file: &Path, urls: Vec<String>) -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let brands = aivis_core::load_brands(&config.brands_path)?.brands;
    let text = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;

    let (mentions, citations) = detect(&text, &brands, &urls);
    let parsed = parse_answer(&mentions);

    let output = serde_json::json!({
        "mentions": mentions,
        "citations": citations,
        "summary": {
            "total_mentions": parsed.total_mentions,
            "competitive_brands": parsed.competitive_brands,
            "dominant_brand": parsed.dominant_brand,
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
