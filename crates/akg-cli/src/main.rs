//! AKG CLI - Command-line interface
//!
//! Usage:
//!   akg fetch <CATEGORY>... --output <file>
//!   akg validate <input> <accepted> <rejected> [--explain]
//!   akg ancestry <node> [--depth N]
//!   akg run <CATEGORY>... --accepted <file> --rejected <file>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use akg_core::{AncestryProvider, AppConfig, LoggingConfig, Triple};
use akg_extractor::PatternExtractor;
use akg_ingest::{HttpTransport, PoolRegistry, RemoteFetcher, WorkerPool};
use akg_ontology::{CachedAncestry, Ontology};
use akg_parser::TripleFormat;
use akg_validator::{BatchPartitioner, TripleValidator, Verdict};

#[derive(Parser)]
#[command(name = "akg")]
#[command(about = "Ancestry-checked knowledge graph extraction")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch abstracts and extract candidate triples
    Fetch {
        /// Ontology categories, e.g. Scientist
        #[arg(required = true)]
        categories: Vec<String>,
        /// Candidate triples output (`.nt` or `.ttl`)
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Split a triple file into accepted and rejected triples
    Validate {
        input: PathBuf,
        accepted: PathBuf,
        rejected: PathBuf,
        /// Print the decision for every triple
        #[arg(long)]
        explain: bool,
    },
    /// Print the ancestry sub-graph of a node
    Ancestry {
        node: String,
        /// Traversal depth (defaults to the configured depth)
        #[arg(long)]
        depth: Option<u32>,
    },
    /// Fetch, extract and validate in one go
    Run {
        #[arg(required = true)]
        categories: Vec<String>,
        #[arg(long)]
        accepted: PathBuf,
        #[arg(long)]
        rejected: PathBuf,
        /// Also keep the unvalidated candidates
        #[arg(long)]
        candidates: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Fetch { categories, output } => {
            let triples = fetch_candidates(&config, &categories).await?;
            akg_parser::write_triples(&output, &triples)?;
            println!("Wrote {} candidate triples to {}", triples.len(), output.display());
        }
        Commands::Validate {
            input,
            accepted,
            rejected,
            explain,
        } => {
            let partitioner = BatchPartitioner::new(load_validator(&config)?);
            let summary = partitioner.partition(&input, &accepted, &rejected)?;
            if explain {
                for triple in akg_parser::read_triples(&input)? {
                    println!("{}\t{triple}", describe(&partitioner.validator().explain(&triple)));
                }
            }
            println!(
                "{} triples: {} accepted, {} rejected",
                summary.total, summary.accepted, summary.rejected
            );
        }
        Commands::Ancestry { node, depth } => {
            let ontology = Ontology::load(&config.ontology.path)?;
            let graph = ontology.build_ancestry(&node, depth.unwrap_or(config.ontology.max_depth));
            if graph.is_empty() {
                println!("{node} has no ancestry within {} hops", graph.max_depth());
            }
            for relation in graph.relations() {
                println!(
                    "{:>3}  {} --{}--> {}",
                    relation.hop, relation.from, relation.label, relation.to
                );
            }
        }
        Commands::Run {
            categories,
            accepted,
            rejected,
            candidates,
        } => {
            // Load the ontology first so a bad path fails before any network work
            let partitioner = BatchPartitioner::new(load_validator(&config)?);
            let triples = fetch_candidates(&config, &categories).await?;
            if let Some(path) = &candidates {
                akg_parser::write_triples(path, &triples)?;
            }

            let format = TripleFormat::from_path(&accepted)?;
            let summary = partitioner
                .partition_triples(&triples)
                .write(&accepted, &rejected, format)?;
            println!(
                "{} triples: {} accepted -> {}, {} rejected -> {}",
                summary.total,
                summary.accepted,
                accepted.display(),
                summary.rejected,
                rejected.display()
            );
        }
    }

    Ok(())
}

fn describe(verdict: &Verdict) -> String {
    match verdict {
        Verdict::SubjectPredicate { shared } => format!("accept (subject) {shared:?}"),
        Verdict::ObjectPredicate { shared } => format!("accept (object) {shared:?}"),
        Verdict::Rejected => "reject".to_string(),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_validator(config: &AppConfig) -> anyhow::Result<TripleValidator> {
    let path = &config.ontology.path;
    let ontology = Ontology::load(path)
        .with_context(|| format!("failed to load ontology {}", path.display()))?;

    let provider: Arc<dyn AncestryProvider> = match config.ontology.cache_capacity {
        0 => Arc::new(ontology),
        capacity => Arc::new(CachedAncestry::new(ontology, capacity)),
    };
    Ok(TripleValidator::new(provider).with_max_depth(config.ontology.max_depth))
}

/// Fetch every category concurrently and collect the extracted triples
async fn fetch_candidates(config: &AppConfig, categories: &[String]) -> anyhow::Result<Vec<Triple>> {
    let registry = Arc::new(PoolRegistry::new());
    let pool = Arc::new(WorkerPool::from_config(
        &config.pool,
        Arc::new(PatternExtractor::new()),
        Arc::clone(&registry),
    ));
    let transport = Arc::new(HttpTransport::from_config(&config.fetcher)?);
    let fetcher = RemoteFetcher::new(transport, Arc::clone(&pool), config.fetcher.clone());

    let interrupt = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, no further workers will be started");
                pool.cancel();
            }
        })
    };

    let results = fetcher.fetch_all(categories).await;
    pool.wait_idle().await;
    interrupt.abort();

    let mut succeeded = 0;
    for (category, result) in &results {
        match result {
            Ok(report) => {
                succeeded += 1;
                tracing::info!(
                    "{category}: {} articles, {} workers",
                    report.articles,
                    report.dispatched
                );
            }
            Err(e) => tracing::error!("{category}: {e}"),
        }
    }

    let stats = registry.stats();
    tracing::info!(
        "Workers: {} completed, {} failed; {} candidate triples",
        stats.completed,
        stats.failed,
        stats.triples
    );

    if succeeded == 0 {
        bail!("all {} category fetches failed", categories.len());
    }
    Ok(registry.take_triples())
}
