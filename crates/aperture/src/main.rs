use std::path::PathBuf;

use anyhow::Context;
use aperture::{telemetry, AppConfig, SearchCoordinator};
use aperture_core::{cache_key, SearchFilters, SearchRequest, SortOrder};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "aperture")]
#[command(version, about = "Photo-video catalog search relevance")]
struct Cli {
    /// Configuration file (defaults to ./aperture.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the classified intent
    Classify { text: String },
    /// Print intent, structured query, filters and ranking envelope
    Explain { text: String },
    /// Run a search against the configured index
    Search {
        text: String,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        per_page: Option<u32>,

        /// relevance, price_asc, price_desc, newest, popular or trending
        #[arg(long, default_value = "relevance")]
        sort: SortOrder,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Suggestions, facets and top products for a prefix
    Autocomplete { text: String },
    /// Print the cache key a search or autocomplete request maps to
    CacheKey {
        text: String,

        /// Autocomplete key instead of search key
        #[arg(long)]
        autocomplete: bool,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        per_page: Option<u32>,

        #[arg(long, default_value = "relevance")]
        sort: SortOrder,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long)]
    brand: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    availability: Option<String>,
    #[arg(long)]
    mount: Option<String>,
    #[arg(long)]
    price_min: Option<f64>,
    #[arg(long)]
    price_max: Option<f64>,
}

impl From<FilterArgs> for SearchFilters {
    fn from(args: FilterArgs) -> Self {
        SearchFilters {
            brand: args.brand,
            category: args.category,
            availability: args.availability,
            mount: args.mount,
            price_min: args.price_min,
            price_max: args.price_max,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn request(
    config: &AppConfig,
    text: String,
    page: u32,
    per_page: Option<u32>,
    sort: SortOrder,
    filters: FilterArgs,
) -> SearchRequest {
    SearchRequest::new(text)
        .with_filters(filters.into())
        .with_page(page, per_page.unwrap_or(config.search.default_per_page))
        .with_sort(sort)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    telemetry::init_tracing(&config.logging.filter);

    match cli.command {
        Commands::Classify { text } => {
            let engine = config.engine()?;
            print_json(&engine.classify(&text))?;
        }
        Commands::Explain { text } => {
            let engine = config.engine()?;
            print_json(&engine.explain(&text))?;
        }
        Commands::Search {
            text,
            page,
            per_page,
            sort,
            filters,
        } => {
            let coordinator = SearchCoordinator::from_config(&config)?;
            let request = request(&config, text, page, per_page, sort, filters);
            print_json(&coordinator.search(request).await?)?;
        }
        Commands::Autocomplete { text } => {
            let coordinator = SearchCoordinator::from_config(&config)?;
            print_json(&coordinator.autocomplete(&text).await?)?;
        }
        Commands::CacheKey {
            text,
            autocomplete,
            page,
            per_page,
            sort,
            filters,
        } => {
            let key = if autocomplete {
                cache_key::autocomplete_key(&text)
            } else {
                cache_key::search_key(&request(&config, text, page, per_page, sort, filters))
            };
            println!("{key}");
        }
    }

    Ok(())
}
