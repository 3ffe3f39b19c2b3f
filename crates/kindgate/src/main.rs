//! Kindgate
//!
//! Runs gateway searches against an Elasticsearch cluster from the command
//! line: one offset page, a federated query across the user's partitions, or
//! a walk over a cursor stream.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use kindgate_search::backends::elasticsearch::ElasticsearchEngine;
use kindgate_search::engine::SearchEngineClient;
use kindgate_search::error::GatewayError;
use kindgate_search::tenant::IdentityContext;
use kindgate_search::types::PageResult;
use kindgate_search::{FederatedSearch, SearchService};

use cli::{Cli, Command, CursorArgs, QueryArgs};

/// Initializes the tracing subscriber. `RUST_LOG` wins over `level`.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("kindgate={},kindgate_search={}", level, level))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_page(page: &PageResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(page)?);
    Ok(())
}

/// Prints the caller-facing rendering of `err` and exits.
fn fail(err: GatewayError) -> ! {
    error!(error = %err, code = err.kind().status_code(), "Search failed");
    let response = err.to_response();
    match serde_json::to_string_pretty(&response) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}: {}", response.code, response.message),
    }
    std::process::exit(1);
}

async fn run_query(
    service: SearchService,
    args: &QueryArgs,
    identity: &IdentityContext,
) -> anyhow::Result<()> {
    let mut spec = args.search.to_spec()?;
    if let Some(offset) = args.offset {
        spec = spec.with_offset(offset);
    }

    let result = if args.federated {
        FederatedSearch::new(service).query(&spec, identity).await
    } else {
        service.query(&spec, identity).await
    };

    match result {
        Ok(page) => print_page(&page),
        Err(e) => fail(e),
    }
}

async fn run_cursor(
    service: SearchService,
    args: &CursorArgs,
    identity: &IdentityContext,
) -> anyhow::Result<()> {
    let mut spec = args.search.to_spec()?;

    for page_number in 1..=args.pages {
        let page = match service.query_with_cursor(&spec, identity).await {
            Ok(page) => page,
            Err(e) => fail(e),
        };
        print_page(&page)?;

        match page.cursor {
            Some(cursor) => {
                spec = spec.with_cursor(cursor);
            }
            None => {
                info!(pages = page_number, "Cursor stream exhausted");
                break;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(errors) = cli.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let gateway_config = cli.gateway_config()?;
    let es_config = cli.elasticsearch_config(&gateway_config);

    let mut errors = gateway_config.validate();
    errors.extend(es_config.validate());
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        nodes = ?es_config.nodes,
        request_timeout_ms = gateway_config.request_timeout_ms,
        alias_threshold = gateway_config.alias_threshold,
        "Starting Kindgate"
    );

    let engine = ElasticsearchEngine::new(es_config)
        .map_err(|e| anyhow::anyhow!("Failed to create Elasticsearch client: {}", e))?;
    if let Err(e) = engine.health_check().await {
        warn!(error = %e, "Elasticsearch health check failed; continuing");
    }

    let engine: Arc<dyn SearchEngineClient> = Arc::new(engine);
    let service = SearchService::with_in_memory_caches(engine, gateway_config);
    let identity = cli.identity()?;

    match &cli.command {
        Command::Query(args) => run_query(service, args, &identity).await,
        Command::Cursor(args) => run_cursor(service, args, &identity).await,
    }
}
