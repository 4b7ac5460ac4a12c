//! Result Store - CLI

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use result_store::{
    Collection, Listing, ResultStore, StoreConfig, collections, render_schema, render_summary,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // File, then environment, then --data-dir
    let config = StoreConfig::load(cli.config.as_deref(), cli.data_dir.clone())?;
    let store = ResultStore::open(&config).await?;
    info!(database_url = %config.database_url(), "Store opened");

    match cli.command {
        Command::Classic { win, loss, guesses } => {
            let won = win && !loss;
            let result = store.add_classic(won, guesses).await?;
            store.increment_stat("played", 1.0).await?;
            println!(
                "classic #{}: {} in {} guesses",
                result.id(),
                if *result.win() { "win" } else { "loss" },
                result.guesses()
            );
        }
        Command::Daily { guesses } => {
            let result = store.put_daily(guesses).await?;
            println!("daily: {} guesses", result.guesses());
        }
        Command::Stat { name, value } => {
            let stat = store.put_stat(&name, value).await?;
            println!("{} = {}", stat.name(), stat.value());
        }
        Command::Bump { name, by } => {
            let stat = store.increment_stat(&name, by).await?;
            println!("{} = {}", stat.name(), stat.value());
        }
        Command::List { collection, json } => {
            let selected: Vec<Collection> = match collection {
                Some(c) => vec![c],
                None => collections().collect(),
            };
            let listing = Listing::load(&store, &selected).await?;
            if json {
                println!("{}", listing.to_json()?);
            } else {
                println!("{}", listing.to_text());
            }
        }
        Command::Summary { json } => {
            let summary = store.classic_summary().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", render_summary(&summary));
            }
        }
        Command::Schema => {
            println!("{}", render_schema());
            println!("engine version {}", store.schema_version().await?);
        }
    }

    Ok(())
}
