//! Application entry point for `weather-monitor`.
//!
//! One binary, three independent processes selected by subcommand:
//! - `init-db` – create tables and seed the sensors, then exit
//! - `collect` – run the collector loop forever
//! - `serve`   – serve the HTML dashboard
//!
//! Each subcommand loads its configuration from the environment (or `.env`)
//! once, initializes logging, opens the store and hands off to the library.
//!
//! # Environment Variables
//! - `CLIMATE_API_KEY` (**required** for `collect`) – weather API key
//! - `DATABASE_URL` (optional) – SQLite connection string
//! - `LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `FORCE_COLOR` (optional) – force ANSI colour on or off
use std::env;

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;

use weather_monitor::{collector::Collector, config, routes, schema, store};

const CMD_INIT_DB: &str = "init-db";
const CMD_COLLECT: &str = "collect";
const CMD_SERVE: &str = "serve";

// ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some(CMD_INIT_DB) => init_db().await,
        Some(CMD_COLLECT) => collect().await,
        Some(CMD_SERVE) => serve().await,
        _ => Err(anyhow!(
            "Subcommand must be one of '{CMD_INIT_DB}', '{CMD_COLLECT}', '{CMD_SERVE}'"
        )),
    }
}

async fn init_db() -> Result<()> {
    // ---
    let store_cfg = config::load_store()?;
    let location = config::load_location();
    store_cfg.log_config();

    let pool = store::connect(&store_cfg)
        .await
        .with_context(|| format!("Failed to open database '{}'", store_cfg.db_url))?;
    schema::create_schema(&pool, &location).await?;

    tracing::info!("Database, tables and base sensors ready");
    Ok(())
}

async fn collect() -> Result<()> {
    // ---
    let cfg = config::load_collector()?;
    cfg.log_config();

    let pool = store::connect(&cfg.store)
        .await
        .with_context(|| format!("Failed to open database '{}'", cfg.store.db_url))?;
    schema::create_schema(&pool, &cfg.city).await?;

    let collector = Collector::new(&cfg, pool).context("Failed to build HTTP client")?;
    collector.run().await;
    Ok(())
}

async fn serve() -> Result<()> {
    // ---
    let cfg = config::load_dashboard()?;
    cfg.log_config();

    let pool = store::connect(&cfg.store)
        .await
        .with_context(|| format!("Failed to open database '{}'", cfg.store.db_url))?;

    let addr = cfg.listen_addr;
    let app = routes::router(pool, cfg);

    tracing::info!("Dashboard listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber.
///
/// - Colour: `FORCE_COLOR=1|true|yes` on, `0|false|no` off, otherwise TTY detection
/// - Level: `RUST_LOG` if set, else `LOG_LEVEL` (default `info`), with
///   `sqlx::query` held at `warn`
fn init_tracing() {
    // ---
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
