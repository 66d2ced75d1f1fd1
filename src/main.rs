use anyhow::{Context, Result};
use dish_recommender::cli::parse_args;
use dish_recommender::recommender::load_engine;
use dish_recommender::web;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env before clap reads env fallbacks

    let cli_args = parse_args();

    let filter = EnvFilter::try_new(&cli_args.log_level)
        .with_context(|| format!("Invalid log filter '{}'", cli_args.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting dish-recommender v{}", env!("CARGO_PKG_VERSION"));

    // Nothing is served unless all three artifacts load and agree.
    let engine = load_engine(&cli_args.artifact_paths())?;
    info!(
        recipes = engine.recipe_count(),
        k = engine.k(),
        "recommendation engine ready"
    );

    web::serve(engine, &cli_args.bind_address()).await
}
