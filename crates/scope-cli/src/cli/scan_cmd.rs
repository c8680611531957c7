use super::*;

pub(super) fn handle_scan(
    config: &AppConfig,
    cache_path: PathBuf,
    force_refresh: bool,
) -> anyhow::Result<()> {
    let request = ScanRequest {
        roots: config.roots.clone(),
        ignore: config.ignore.clone(),
        max_age: config.cache_max_age(),
        force_refresh,
        use_cache: true,
    };
    let inspector = GitStatusInspector::new(config.status_timeout());
    let mut cache = ResultCache::new(cache_path);
    let outcome = scan_with_cache(&request, &mut cache, &inspector).context("scan repositories")?;
    info!(
        count = outcome.repos.len(),
        from_cache = outcome.from_cache,
        "Scan finished"
    );
    let json = serde_json::to_string_pretty(&outcome.repos).context("serialize repos")?;
    println!("{json}");
    Ok(())
}
