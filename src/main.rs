use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use release_scout::cli::{ALL_PROVIDERS, Command, USAGE};
use release_scout::config::{Config, EnvPreferences};
use release_scout::indexer::definitions::{
    AVAILABLE_PROVIDERS, ProviderContext, build_provider,
};
use release_scout::indexer::normalize::normalize;
use release_scout::indexer::{
    MediaDescriptor, Provider, ProviderManager, RawItem, SearchOptions, SmartSearchOptions,
};
use release_scout::services::logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    logging::init(config.log_format);

    let command = match Command::from_args() {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {:#}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    tracing::debug!(?command, "Starting");

    let provider_id = command.provider().map(str::to_string);
    match provider_id.as_deref() {
        None => print_providers(),
        Some(ALL_PROVIDERS) => run_all(&config, command).await,
        Some(id) => {
            let provider = load_provider(&base_context(&config)?, id)?;
            run_single(provider, command).await
        }
    }
}

/// Shared HTTP client; each provider swaps in its own preferences
fn base_context(config: &Config) -> Result<ProviderContext> {
    ProviderContext::new(config, Arc::new(HashMap::<String, String>::new()))
        .context("Failed to create HTTP client")
}

fn load_provider(base: &ProviderContext, id: &str) -> Result<Arc<dyn Provider>> {
    let ctx = base.with_preferences(Arc::new(EnvPreferences::new(id)));
    build_provider(id, ctx).with_context(|| format!("Unknown provider: {}", id))
}

async fn run_single(provider: Arc<dyn Provider>, command: Command) -> Result<()> {
    match command {
        Command::Providers => print_providers(),
        Command::Latest { .. } => print_json(&provider.get_latest().await),
        Command::Search { query, .. } => {
            let options = SearchOptions {
                query,
                ..Default::default()
            };
            print_json(&provider.search(&options).await)
        }
        Command::Smart { .. } => {
            let options = smart_options(&command).await?;
            print_json(&provider.smart_search(&options).await)
        }
        Command::Magnet { page_url, .. } => {
            let release = normalize(
                RawItem {
                    title: page_url.clone(),
                    page_link: page_url,
                    ..Default::default()
                },
                &release_scout::services::AnimeReleaseParser,
            );
            let magnet = provider
                .resolve_magnet_link(&release)
                .await
                .context("No magnet link available")?;
            print_json(&release.with_magnet_link(magnet))
        }
    }
}

async fn run_all(config: &Config, command: Command) -> Result<()> {
    let manager = ProviderManager::new(config.provider_concurrency);
    let base = base_context(config)?;
    for info in AVAILABLE_PROVIDERS.iter() {
        manager.register(load_provider(&base, info.id)?);
    }

    match &command {
        Command::Search { query, .. } => {
            let options = SearchOptions {
                query: query.clone(),
                ..Default::default()
            };
            print_json(&manager.search_all(&options).await)
        }
        Command::Smart { .. } => {
            let options = smart_options(&command).await?;
            print_json(&manager.smart_search_all(&options).await)
        }
        _ => anyhow::bail!("Only search and smart work across all providers"),
    }
}

async fn smart_options(command: &Command) -> Result<SmartSearchOptions> {
    let Command::Smart {
        media_path,
        episode,
        batch,
        resolution,
        query,
        ..
    } = command
    else {
        anyhow::bail!("Not a smart search command");
    };

    let raw = tokio::fs::read_to_string(media_path)
        .await
        .with_context(|| format!("Failed to read {}", media_path.display()))?;
    let media: MediaDescriptor =
        serde_json::from_str(&raw).context("Invalid media descriptor JSON")?;

    Ok(SmartSearchOptions {
        media,
        query: query.clone(),
        batch: *batch,
        episode_number: *episode,
        resolution: resolution.clone(),
    })
}

fn print_providers() -> Result<()> {
    let providers: Vec<_> = AVAILABLE_PROVIDERS
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "description": p.description,
                "type": p.kind,
                "supportsAdult": p.supports_adult,
                "site": p.site_link,
            })
        })
        .collect();
    print_json(&providers)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
