use crate::output::{table, Output};
use catalog_sync_config::{
    default_scheduler_config, CacheConfig, Config, ContinueWatchingConfig, PathManager,
    SearchConfig, SyncOptions, TmdbConfig, TraktConfig,
};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;

fn mask(secret: &str) -> String {
    if secret.is_empty() || secret.starts_with("YOUR_") {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn run_show(full: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run `catalogsync config init` to create one.");
        return Ok(());
    }
    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let secret = |s: &str| if full { s.to_string() } else { mask(s) };
    let registry = config.registry()?;

    let summary = json!({
        "config_file": config_file.display().to_string(),
        "trakt": { "client_id": secret(&config.trakt.client_id), "base_url": config.trakt.base_url },
        "tmdb": { "access_token": secret(&config.tmdb.access_token), "base_url": config.tmdb.base_url },
        "lists": registry.iter().map(|l| json!({
            "id": l.id, "kind": l.kind, "cache_key": l.cache_key, "enabled": l.enabled,
        })).collect::<Vec<_>>(),
    });

    output.result(&summary, || {
        let mut t = table(["Setting", "Value"]);
        t.add_row(vec!["Config file".to_string(), config_file.display().to_string()]);
        t.add_row(vec!["Trakt client ID".to_string(), secret(&config.trakt.client_id)]);
        t.add_row(vec!["TMDB access token".to_string(), secret(&config.tmdb.access_token)]);
        t.add_row(vec!["Page size".to_string(), config.sync.page_size.to_string()]);
        t.add_row(vec![
            "Virtual list TTL".to_string(),
            format!("{}h", config.cache.virtual_list_ttl_hours),
        ]);
        t.add_row(vec!["Ratings TTL".to_string(), format!("{}d", config.cache.ratings_ttl_days)]);
        for list in registry.iter() {
            t.add_row(vec![
                format!("List {}", list.id),
                format!(
                    "{} {} -> {}{}",
                    list.kind,
                    list.title,
                    list.cache_key,
                    if list.enabled { "" } else { " (disabled)" }
                ),
            ]);
        }
        t
    });
    Ok(())
}

/// Write a starter config with placeholder credentials.
pub fn run_init(force: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        return Err(eyre!(
            "{} already exists (use --force to overwrite)",
            config_file.display()
        ));
    }

    let config = Config {
        trakt: TraktConfig {
            client_id: "YOUR_CLIENT_ID".to_string(),
            client_secret: "YOUR_CLIENT_SECRET".to_string(),
            base_url: "https://api.trakt.tv".to_string(),
        },
        tmdb: TmdbConfig {
            access_token: "YOUR_ACCESS_TOKEN".to_string(),
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
        },
        sync: SyncOptions::default(),
        cache: CacheConfig::default(),
        continue_watching: ContinueWatchingConfig::default(),
        search: SearchConfig::default(),
        scheduler: Some(default_scheduler_config()),
        lists: Vec::new(),
    };
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote {}", config_file.display()));
    output.info("Fill in the Trakt and TMDB credentials before syncing.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("YOUR_ACCESS_TOKEN"), "<not set>");
        assert_eq!(mask("0123456789abcdef"), "0123...cdef");
    }
}
