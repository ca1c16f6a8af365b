//! Company Search server
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use company_search::{
    config,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            "-V" | "--version" => {
                println!("company-search {}", company_search::VERSION);
                return Ok(());
            }
            _ => {}
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "company_search=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("Starting company-search v{}", company_search::VERSION);

    // Load configuration; missing secrets are fatal
    let settings = config::load().context("invalid configuration")?;

    let addr = SocketAddr::new(
        settings
            .server
            .bind_address
            .parse()
            .with_context(|| format!("bad bind address {}", settings.server.bind_address))?,
        settings.server.port,
    );

    // Create application state
    let state = AppState::from_settings(settings)?;
    info!(
        "Providers ready: {}",
        state.search.providers().names().join(", ")
    );

    // Create router
    let app = create_router(state);

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
company-search v{}
Company lookup across web, neural and news search

USAGE:
    company-search [OPTIONS]

OPTIONS:
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    COMPANY_SEARCH_SETTINGS_PATH  Path to settings.yml
    COMPANY_SEARCH_USERNAME       Login username
    COMPANY_SEARCH_PASSWORD       Login password
    SERPER_API_KEY                Serper API key
    EXA_API_KEY                   Exa API key
    NEWSAPI_API_KEY               NewsAPI API key
    COMPANY_SEARCH_PORT           Server port
    COMPANY_SEARCH_BIND_ADDRESS   Bind address
    RUST_LOG                      Log filter
"#,
        company_search::VERSION
    );
}
