//! Minimal CLI parsing.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

pub const USAGE: &str = "\
Usage: release-scout <provider|all> <command> [args]
       release-scout providers

Commands:
  latest                         Most recent uploads
  search <query>                 Search with a literal query
  smart <media.json> [options]   Search with synthesized queries
      --episode <n>              Requested episode (default 1)
      --batch                    Look for batches instead of episodes
      --resolution <res>         e.g. 1080
      --query <q>                Use this query instead of the titles
  magnet <page-url>              Resolve a detail page magnet link as a release

Provider preferences are read from <PROVIDER>_<KEY> environment variables,
e.g. NYAA_API_URL, NYAA_CATEGORY, SEADEX_API_URL.";

/// Pseudo provider id addressing every catalogued provider
pub const ALL_PROVIDERS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Providers,
    Latest {
        provider: String,
    },
    Search {
        provider: String,
        query: String,
    },
    Smart {
        provider: String,
        media_path: PathBuf,
        episode: i32,
        batch: bool,
        resolution: Option<String>,
        query: Option<String>,
    },
    Magnet {
        provider: String,
        page_url: String,
    },
}

impl Command {
    pub fn from_args() -> Result<Self> {
        Self::parse(env::args().skip(1))
    }

    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let provider = args.next().ok_or_else(|| anyhow!("Missing provider"))?;
        if provider == "providers" {
            return Ok(Command::Providers);
        }

        let command = args.next().ok_or_else(|| anyhow!("Missing command"))?;
        match command.as_str() {
            "latest" => Ok(Command::Latest { provider }),
            "search" => {
                let query: Vec<String> = args.collect();
                if query.is_empty() {
                    bail!("search needs a query");
                }
                Ok(Command::Search {
                    provider,
                    query: query.join(" "),
                })
            }
            "smart" => {
                let media_path = args
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| anyhow!("smart needs a media JSON file"))?;

                let mut episode = 1;
                let mut batch = false;
                let mut resolution = None;
                let mut query = None;

                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--batch" => batch = true,
                        "--episode" => {
                            let value = args.next().context("--episode needs a value")?;
                            episode = value
                                .parse()
                                .with_context(|| format!("Invalid episode: {}", value))?;
                        }
                        "--resolution" => {
                            resolution = Some(args.next().context("--resolution needs a value")?);
                        }
                        "--query" => {
                            query = Some(args.next().context("--query needs a value")?);
                        }
                        other => bail!("Unknown option: {}", other),
                    }
                }

                Ok(Command::Smart {
                    provider,
                    media_path,
                    episode,
                    batch,
                    resolution,
                    query,
                })
            }
            "magnet" => {
                let page_url = args.next().ok_or_else(|| anyhow!("magnet needs a page URL"))?;
                Ok(Command::Magnet { provider, page_url })
            }
            other => bail!("Unknown command: {}", other),
        }
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            Command::Providers => None,
            Command::Latest { provider }
            | Command::Search { provider, .. }
            | Command::Smart { provider, .. }
            | Command::Magnet { provider, .. } => Some(provider),
        }
    }
}
