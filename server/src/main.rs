use anyhow::Result;
use axum::Router;
use catalog_core::{open_lexicon, Bm25Params, JsonCatalog, SearchConfig, SearchEngine};
use clap::Parser;
use server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Catalog file (.json / .jsonl) or directory of them
    #[arg(long, default_value = "./catalog.json")]
    catalog: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 5000)]
    port: u16,
    /// WordNet dict/ directory used for synonym expansion
    #[arg(long)]
    wordnet: Option<PathBuf>,
    /// JSON synonym table, used when no WordNet directory is given
    #[arg(long)]
    synonyms: Option<PathBuf>,
    /// Results per query unless the request asks otherwise
    #[arg(long, default_value_t = 5)]
    top_k: usize,
    /// BM25 term-frequency saturation
    #[arg(long, default_value_t = 1.5)]
    k1: f32,
    /// BM25 length normalization
    #[arg(long, default_value_t = 0.75)]
    b: f32,
    /// Minimum similarity (0-100) for vocabulary corrections
    #[arg(long, default_value_t = 80.0)]
    cutoff: f64,
    /// Skip the startup refresh; the first query builds the index
    #[arg(long, default_value_t = false)]
    lazy: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    let config = SearchConfig {
        top_k: args.top_k,
        correction_cutoff: args.cutoff,
        bm25: Bm25Params { k1: args.k1, b: args.b },
        ..SearchConfig::default()
    };
    let lexicon = open_lexicon(args.wordnet.as_deref(), args.synonyms.as_deref())?;
    let source = Arc::new(JsonCatalog::new(&args.catalog));
    let engine = Arc::new(SearchEngine::new(source, lexicon, config));

    if !args.lazy {
        let startup = Arc::clone(&engine);
        if let Err(err) = tokio::task::spawn_blocking(move || startup.refresh()).await? {
            tracing::warn!(error = %err, catalog = %args.catalog, "startup refresh failed");
        }
    }

    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let app: Router = build_app(engine, admin_token);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
