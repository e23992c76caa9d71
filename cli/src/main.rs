use anyhow::Result;
use catalog_core::{open_lexicon, JsonCatalog, SearchConfig, SearchEngine};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Rank catalog records against free-text queries from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CatalogArgs {
    /// Catalog file (.json / .jsonl) or directory of them
    #[arg(long)]
    catalog: PathBuf,
    /// WordNet dict/ directory used for synonym expansion
    #[arg(long)]
    wordnet: Option<PathBuf>,
    /// JSON synonym table, used when no WordNet directory is given
    #[arg(long)]
    synonyms: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one query and print the ranked records
    Search {
        #[command(flatten)]
        source: CatalogArgs,
        /// Free-text query
        #[arg(long)]
        query: String,
        /// Only return records in this category (case-insensitive)
        #[arg(long)]
        category: Option<String>,
        /// Number of results
        #[arg(long)]
        k: Option<usize>,
    },
    /// Print statistics about the built index
    Stats {
        #[command(flatten)]
        source: CatalogArgs,
    },
    /// Show how words are corrected and expanded
    Correct {
        #[command(flatten)]
        source: CatalogArgs,
        words: Vec<String>,
    },
}

#[derive(Serialize)]
struct Correction {
    word: String,
    corrected: String,
    closest: Option<String>,
    similarity: Option<f64>,
    synonyms: Vec<String>,
}

fn open_engine(args: &CatalogArgs) -> Result<SearchEngine> {
    let lexicon = open_lexicon(args.wordnet.as_deref(), args.synonyms.as_deref())?;
    let source = Arc::new(JsonCatalog::new(&args.catalog));
    Ok(SearchEngine::new(source, lexicon, SearchConfig::default()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { source, query, category, k } => {
            if query.trim().is_empty() {
                anyhow::bail!("query cannot be empty");
            }
            let engine = open_engine(&source)?;
            engine.refresh()?;
            let k = engine.config().clamp_k(k);
            let hits = engine.search(&query, category.as_deref(), k)?;
            tracing::info!(query = %query, k, hits = hits.len(), "search complete");
            print_json(&hits)
        }
        Commands::Stats { source } => {
            let engine = open_engine(&source)?;
            let generation = engine.refresh()?;
            print_json(&generation.stats())
        }
        Commands::Correct { source, words } => {
            let engine = open_engine(&source)?;
            let generation = engine.refresh()?;
            let vocabulary = generation.vocabulary();
            let cutoff = engine.preprocessor().cutoff();
            let expander = engine.preprocessor().expander();
            let report: Vec<Correction> = words
                .iter()
                .map(|word| {
                    let word = word.to_lowercase();
                    let best = vocabulary.best_match(&word);
                    let corrected = vocabulary.correct(&word, cutoff);
                    let synonyms = expander.synonyms(&corrected);
                    Correction {
                        closest: best.map(|(entry, _)| entry.to_string()),
                        similarity: best.map(|(_, score)| score),
                        word,
                        corrected,
                        synonyms,
                    }
                })
                .collect();
            print_json(&report)
        }
    }
}
