//! `aivis-cli index` — compute the visibility index from stored scores.

pub(crate) async fn execute(brand: Option<String>, window_days: Option<u32>) -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let window_days = window_days.unwrap_or(config.index_window_days);

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;

    let scores = aivis_db::list_scores_in_window(&pool, brand.as_deref(), window_days).await?;
    let index = aivis_scorer::visibility_index(&scores, window_days);

    let output = serde_json::json!({
        "index": index,
        "brand_id": brand,
        "window_days": window_days,
        "score_count": scores.len(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
