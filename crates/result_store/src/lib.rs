//! Result Store - local persistence for a guessing game
//!
//! Keeps three collections in one versioned SQLite database:
//!
//! - **classic**: one record per classic-mode game (`win`, `guesses`), keyed by
//!   an engine-assigned id
//! - **daily**: daily-mode results keyed by guess count
//! - **stats**: named numeric statistics keyed by name
//!
//! # Example
//!
//! ```no_run
//! use result_store::{ClassicQuery, ResultStore, StoreConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store = ResultStore::open(&StoreConfig::in_dir("data")).await?;
//!
//! let game = store.add_classic(true, 4).await?;
//! store.increment_stat("played", 1.0).await?;
//!
//! let wins = store.find_classic(ClassicQuery::wins()).await?;
//! assert!(wins.iter().any(|r| r.id() == game.id()));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod report;
mod result_store;
mod store;

// Crate-level exports - Configuration
pub use config::{ConfigError, DATA_DIR_ENV, DEFAULT_DATA_DIR, StoreConfig};

// Crate-level exports - Rendering
pub use report::{Listing, render_schema, render_summary};

// Crate-level exports - Async store handle
pub use result_store::ResultStore;

// Crate-level exports - Storage layer
pub use store::{
    ClassicQuery, ClassicResult, ClassicSummary, Collection, CollectionSchema, DATABASE_SCHEMA,
    DailyResult, DatabaseSchema, IN_MEMORY, NewClassicResult, PrimaryKey, ResultRepository, Stat,
    StoreError, StoreErrorKind, collections,
};
