//! gridscrape: SteamGridDB scraper CLI
//!
//! Search titles, inspect metadata and artwork, and download assets.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use dialoguer::Select;
use gridscrape::{
    AssetKind, AssetOutcome, Candidate, CandidateSelector, Config, EntityOutcome, EntityRef,
    EntityStore, ScrapeError, ScrapeSettings, ScrapeStrategy, ScrapeSubject, Scraper, SteamGridDb,
    SteamGridDbBuilder,
};

/// SteamGridDB scraper
#[derive(Parser)]
#[command(name = "gridscrape")]
#[command(version = gridscrape::PKG_VERSION)]
#[command(about = "Search SteamGridDB and download game artwork")]
struct Args {
    /// Config file (default: ~/.gridscrape/config.toml, then /etc/gridscrape/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key (overrides config file)
    #[arg(long, env = "STEAMGRIDDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search for candidates
    Search {
        term: String,
        #[arg(short, long, default_value = "")]
        platform: String,
    },

    /// Show metadata of the best match
    Metadata {
        term: String,
        #[arg(short, long, default_value = "")]
        platform: String,
    },

    /// List assets of the best match
    Assets {
        term: String,
        #[arg(short, long, default_value = "")]
        platform: String,
        /// Asset kind (box_front, clear_logo, fanart)
        #[arg(short, long, default_value = "box_front")]
        kind: AssetKind,
    },

    /// Scrape a title and download its artwork
    Scrape {
        term: String,
        #[arg(short, long, default_value = "")]
        platform: String,
        /// Output directory; each asset kind gets a subdirectory
        #[arg(short, long)]
        out: PathBuf,
        /// Asset kinds to download (default: all supported)
        #[arg(short, long)]
        kind: Vec<AssetKind>,
        /// Pick the candidate from a list
        #[arg(short, long)]
        interactive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    tracing::debug!(
        version = %gridscrape::version_string(),
        built = gridscrape::BUILD_TIMESTAMP,
        "starting"
    );
    let config = Config::load(args.config.as_deref())?;
    let mut builder = SteamGridDbBuilder::from_config(&config);
    if let Some(key) = args.api_key {
        builder = builder.api_key(key);
    }
    let scraper = builder.build()?;

    let status = scraper.check_credentials();
    if !status.ok {
        eprintln!("{}", status.message);
        std::process::exit(2);
    }

    match args.command {
        Command::Search { term, platform } => {
            let candidates = scraper.search(&term, &platform).await?;
            if candidates.is_empty() {
                println!("no candidates for '{term}'");
            }
            for c in &candidates {
                println!("{:>8}  [{}]  {}", c.id, c.match_score, c.display_name);
            }
        }

        Command::Metadata { term, platform } => {
            let best = best_candidate(&scraper, &term, &platform).await?;
            let metadata = scraper.metadata(&best).await?;
            println!("id:    {}", best.id);
            println!("title: {}", metadata.title);
            match metadata.release_year {
                Some(year) => println!("year:  {year}"),
                None => println!("year:  unknown"),
            }
        }

        Command::Assets {
            term,
            platform,
            kind,
        } => {
            let best = best_candidate(&scraper, &term, &platform).await?;
            let assets = scraper.assets(&best, kind).await?;
            if assets.is_empty() {
                println!("no {kind} assets for '{}'", best.display_name);
            }
            for asset in &assets {
                println!("{}", asset.display_name);
                println!("  full:  {}", asset.full_url);
                println!("  thumb: {}", asset.thumbnail_url);
            }
        }

        Command::Scrape {
            term,
            platform,
            out,
            kind,
            interactive,
        } => {
            let kinds = if kind.is_empty() {
                scraper.supported_assets().to_vec()
            } else {
                kind
            };
            let mut subject = ScrapeSubject::new(term.clone(), term, platform);
            for &kind in &kinds {
                subject = subject.asset_dir(kind, out.join(kind.as_str()));
            }

            let settings = ScrapeSettings {
                scrape_metadata: true,
                asset_kinds: kinds,
            };
            let store = Arc::new(DirectoryStore { subject, out });
            let mut strategy = ScrapeStrategy::new(Arc::new(scraper), store, settings);
            if interactive {
                strategy = strategy.with_selector(Arc::new(PromptSelector));
            }

            let entity = EntityRef::rom("cli");
            for outcome in strategy.process(&entity).await? {
                print_outcome(&outcome);
            }
            return Ok(());
        }
    }

    scraper.flush()?;
    Ok(())
}

async fn best_candidate(
    scraper: &SteamGridDb,
    term: &str,
    platform: &str,
) -> Result<Candidate, Box<dyn std::error::Error>> {
    let candidates = scraper.search(term, platform).await?;
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| format!("no candidates for '{term}'").into())
}

fn print_outcome(outcome: &EntityOutcome) {
    let mark = if outcome.status.ok { "ok" } else { "FAILED" };
    println!("{mark}: {}", outcome.status.message);
    if let Some(metadata) = &outcome.metadata {
        let year = metadata
            .release_year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("  {} ({year})", metadata.title);
    }
    for asset in &outcome.assets {
        match asset {
            AssetOutcome::Downloaded { kind, path } => {
                println!("  {kind}: {}", path.display());
            }
            AssetOutcome::NotAvailable { kind } => println!("  {kind}: none available"),
            AssetOutcome::Failed { kind, message } => println!("  {kind}: failed ({message})"),
        }
    }
}

/// Single-title store backed by the output directory.
struct DirectoryStore {
    subject: ScrapeSubject,
    out: PathBuf,
}

#[async_trait]
impl EntityStore for DirectoryStore {
    async fn subjects(&self, _entity: &EntityRef) -> gridscrape::Result<Vec<ScrapeSubject>> {
        Ok(vec![self.subject.clone()])
    }

    async fn store(
        &self,
        _entity: &EntityRef,
        outcomes: &[EntityOutcome],
    ) -> gridscrape::Result<()> {
        let json = serde_json::to_vec_pretty(outcomes)
            .map_err(|e| ScrapeError::Store(e.to_string()))?;
        tokio::fs::create_dir_all(&self.out).await?;
        let path = self.out.join(format!("{}.json", self.subject.file_stem));
        tokio::fs::write(&path, json).await?;
        Ok(())
    }
}

/// Lets the user choose the candidate on the terminal.
struct PromptSelector;

impl CandidateSelector for PromptSelector {
    fn select(&self, subject: &ScrapeSubject, candidates: &[Candidate]) -> Option<usize> {
        let items: Vec<String> = candidates
            .iter()
            .map(|c| format!("{} [{}]", c.display_name, c.match_score))
            .collect();
        Select::new()
            .with_prompt(format!("Select a match for '{}'", subject.search_term))
            .items(&items)
            .default(0)
            .interact_opt()
            .unwrap_or_else(|e| {
                eprintln!("selection failed: {e}");
                None
            })
    }
}
