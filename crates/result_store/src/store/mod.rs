//! Persistence layer for classic results, daily results and named statistics.

mod error;
mod layout;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::{StoreError, StoreErrorKind};
pub use layout::{
    Collection, CollectionSchema, DATABASE_SCHEMA, DatabaseSchema, PrimaryKey, collections,
};
pub use models::{ClassicQuery, ClassicResult, ClassicSummary, DailyResult, NewClassicResult, Stat};
pub use repository::{IN_MEMORY, ResultRepository};
