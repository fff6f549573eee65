mod classify;
mod config;
mod dedupe;
mod enrich;
mod history;
mod identity;
mod models;
mod normalize;
mod output;
mod pipeline;
mod rank;
mod score;
mod scrape;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use classify::Classifier;
use config::PipelineConfig;
use enrich::{ApolloClient, Enricher};
use history::{JsonSnapshotStore, SeenLeads, SnapshotStore};
use normalize::{SourceSchema, adapt};
use pipeline::SelectionOptions;
use scrape::{ApifySource, JobSource, JsonFileSource};

#[derive(Parser)]
#[command(name = "prospect")]
#[command(about = "Commercial insurance lead generation - scrape, score, and rank prospects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and publish lead artifacts
    Run {
        /// Read raw postings from a JSON file instead of the live scraper
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Input schema (apify-indeed, jobspy)
        #[arg(long, default_value = "jobspy")]
        schema: SourceSchema,

        /// Number of leads to select
        #[arg(short, long)]
        top: Option<usize>,

        /// Dedup policy (exclude-seen, reshuffle)
        #[arg(long)]
        policy: Option<dedupe::DedupePolicy>,

        /// Keep only the most urgent posting per company
        #[arg(long)]
        one_per_company: bool,

        /// Rank strictly by score instead of shuffled tiers
        #[arg(long)]
        no_tiering: bool,
    },

    /// Manage company headcount snapshots
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Manage the seen-leads set
    Seen {
        #[command(subcommand)]
        command: SeenCommands,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List tracked companies
    List {
        /// Snapshot file
        #[arg(long, default_value = "company_history.json")]
        file: PathBuf,
    },

    /// Delete all snapshots
    Clear {
        /// Snapshot file
        #[arg(long, default_value = "company_history.json")]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum SeenCommands {
    /// Show how many leads have been surfaced
    Count {
        /// Seen-leads file
        #[arg(long, default_value = "collected_leads.json")]
        file: PathBuf,
    },

    /// Forget all surfaced leads
    Clear {
        /// Seen-leads file
        #[arg(long, default_value = "collected_leads.json")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { input, schema, top, policy, one_per_company, no_tiering } => {
            let mut config = PipelineConfig::from_env()?;
            if let Some(top) = top {
                config.top_n = top;
            }
            if let Some(policy) = policy {
                config.dedupe_policy = policy;
            }
            config.one_per_company |= one_per_company;
            config.tiering &= !no_tiering;
            run_pipeline(&config, input, schema)?;
        }

        Commands::History { command } => match command {
            HistoryCommands::List { file } => {
                let store = JsonSnapshotStore::open(&file);
                if store.is_empty() {
                    println!("No companies tracked.");
                } else {
                    println!("{:<40} {:>10}  {}", "COMPANY", "HEADCOUNT", "LAST CHECK");
                    let mut entries: Vec<_> = store.iter().collect();
                    entries.sort_by(|a, b| a.1.name.cmp(&b.1.name));
                    for (_, snapshot) in entries {
                        println!(
                            "{:<40} {:>10}  {}",
                            snapshot.name,
                            snapshot.headcount,
                            snapshot.last_check.format("%Y-%m-%d")
                        );
                    }
                }
            }
            HistoryCommands::Clear { file } => {
                match std::fs::remove_file(&file) {
                    Ok(()) => println!("Cleared {}", file.display()),
                    Err(_) => println!("Nothing to clear at {}", file.display()),
                }
            }
        },

        Commands::Seen { command } => match command {
            SeenCommands::Count { file } => {
                let seen = SeenLeads::open(&file);
                println!("{} leads surfaced so far.", seen.ids().len());
            }
            SeenCommands::Clear { file } => {
                match std::fs::remove_file(&file) {
                    Ok(()) => println!("Cleared {}", file.display()),
                    Err(_) => println!("Nothing to clear at {}", file.display()),
                }
            }
        },
    }

    Ok(())
}

fn run_pipeline(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    schema: SourceSchema,
) -> Result<()> {
    let records = collect_records(config, input, schema)?;
    println!("Collected {} raw postings.", records.len());

    let directory = ApolloClient::new(config.apollo_token.clone())?;
    let enricher = Enricher::new(directory, config.pace, config.size_band);

    let mut snapshots = JsonSnapshotStore::open(&config.snapshot_path);
    let mut seen = SeenLeads::open(&config.seen_leads_path);

    let options = SelectionOptions {
        dedupe_policy: config.dedupe_policy,
        one_per_company: config.one_per_company,
        top_n: config.top_n,
        tiering: config.tiering,
        tier_thresholds: config.tier_thresholds,
    };

    let (selected, summary) = pipeline::run(
        &records,
        &Classifier::default(),
        &enricher,
        &mut snapshots,
        &mut seen,
        &options,
        chrono::Utc::now(),
    )?;
    snapshots.persist()?;

    if selected.is_empty() {
        println!("No qualifying leads this run.");
        return Ok(());
    }

    let csv_path = output::publish(&selected, &config.output_dir)?;
    println!(
        "Selected {} of {} qualifying leads -> {}",
        summary.selected, summary.fresh, csv_path.display()
    );
    Ok(())
}

fn collect_records(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    schema: SourceSchema,
) -> Result<Vec<models::RawRecord>> {
    let mut records = Vec::new();
    match input {
        Some(path) => {
            let source = JsonFileSource::new(path, schema);
            for item in source.fetch("")? {
                records.push(adapt(&item, source.schema()));
            }
        }
        None => {
            let token = config
                .apify_token
                .clone()
                .context("APIFY_API_TOKEN required for live scraping (or pass --input)")?;
            let source = ApifySource::new(
                token,
                config.apify_actor_id.clone(),
                config.max_items_per_search,
            )?;
            // One search per term; a failed term costs its postings, not
            // the run.
            for term in &config.search_terms {
                match source.fetch(term) {
                    Ok(items) => {
                        records.extend(items.iter().map(|i| adapt(i, source.schema())));
                    }
                    Err(e) => warn!("search '{term}' failed: {e}"),
                }
            }
        }
    }
    Ok(records)
}
