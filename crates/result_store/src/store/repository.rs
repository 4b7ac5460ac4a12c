//! Synchronous repository over the result database.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::Sqlite;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::store::{
    ClassicQuery, ClassicResult, ClassicSummary, DATABASE_SCHEMA, DailyResult, NewClassicResult,
    Stat, StoreError, schema,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Location string diesel understands as a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

#[derive(QueryableByName)]
struct UserVersion {
    #[diesel(sql_type = Integer)]
    user_version: i32,
}

#[derive(QueryableByName)]
struct MasterEntry {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Typed accessor for the `stats`, `classic` and `daily` collections.
///
/// Holds the single engine connection; clones share it.
#[derive(Clone)]
pub struct ResultRepository {
    database_url: String,
    connection: Arc<Mutex<SqliteConnection>>,
}

impl fmt::Debug for ResultRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRepository")
            .field("database_url", &self.database_url)
            .finish_non_exhaustive()
    }
}

impl ResultRepository {
    /// Opens the database at `database_url` and declares the schema.
    ///
    /// Use [`IN_MEMORY`] for a database that lives as long as the repository.
    ///
    /// # Errors
    ///
    /// Returns a `StorageUnavailable` [`StoreError`] if the engine cannot be
    /// opened, the stored schema version is newer than this build, or the
    /// declared collections are missing after initialization.
    #[instrument(skip(database_url), fields(database_url = %database_url))]
    pub fn open(database_url: String, busy_timeout: Duration) -> Result<Self, StoreError> {
        info!("Opening result database");
        let mut conn = SqliteConnection::establish(&database_url).map_err(|e| {
            StoreError::unavailable(format!("Failed to open '{}': {}", database_url, e))
        })?;

        let pragma = format!("PRAGMA busy_timeout = {};", busy_timeout.as_millis());
        conn.batch_execute(&pragma).map_err(|e| {
            StoreError::unavailable(format!("Failed to configure engine: {}", e))
        })?;

        initialize_schema(&mut conn)?;

        info!(
            database_url = %database_url,
            version = DATABASE_SCHEMA.version,
            "Result database open"
        );
        Ok(Self {
            database_url,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens a fresh in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if schema initialization fails.
    #[instrument]
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(IN_MEMORY.to_string(), Duration::from_secs(5))
    }

    /// Location this repository was opened with.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Runs `op` with exclusive access to the connection.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&mut SqliteConnection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self
            .connection
            .lock()
            .map_err(|_| StoreError::unavailable("Connection lock poisoned"))?;
        op(&mut conn)
    }

    /// Schema version stamped in the engine.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the pragma cannot be read.
    #[instrument(skip(self))]
    pub fn schema_version(&self) -> Result<i32, StoreError> {
        self.with_connection(|conn| {
            read_user_version(conn)
                .map_err(|e| StoreError::query(format!("Failed to read schema version: {}", e)))
        })
    }

    /// Records a classic result and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns a `WriteFailure` [`StoreError`] if the insert is rejected.
    #[instrument(skip(self, result), fields(win = result.win(), guesses = result.guesses()))]
    pub fn insert_classic(&self, result: NewClassicResult) -> Result<ClassicResult, StoreError> {
        debug!("Recording classic result");
        let recorded = self.with_connection(|conn| {
            diesel::insert_into(schema::classic::table)
                .values(&result)
                .returning(ClassicResult::as_returning())
                .get_result(conn)
                .map_err(|e| StoreError::write(format!("Failed to insert classic result: {}", e)))
        })?;

        info!(
            id = recorded.id(),
            win = recorded.win(),
            guesses = recorded.guesses(),
            "Classic result recorded"
        );
        Ok(recorded)
    }

    /// Gets a classic result by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn get_classic(&self, id: i32) -> Result<Option<ClassicResult>, StoreError> {
        debug!(id = %id, "Looking up classic result");
        self.with_connection(|conn| {
            schema::classic::table
                .find(id)
                .select(ClassicResult::as_select())
                .first(conn)
                .optional()
                .map_err(|e| StoreError::query(format!("Failed to load classic result: {}", e)))
        })
    }

    /// Lists classic results matching `query`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn find_classic(&self, query: ClassicQuery) -> Result<Vec<ClassicResult>, StoreError> {
        debug!("Querying classic results");
        let results = self.with_connection(|conn| {
            filtered_classic(&query)
                .order(schema::classic::id.asc())
                .select(ClassicResult::as_select())
                .load(conn)
                .map_err(|e| StoreError::query(format!("Failed to query classic results: {}", e)))
        })?;

        info!(count = results.len(), "Classic results loaded");
        Ok(results)
    }

    /// Counts classic results matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn count_classic(&self, query: ClassicQuery) -> Result<i64, StoreError> {
        self.with_connection(|conn| {
            filtered_classic(&query)
                .select(diesel::dsl::count_star())
                .first(conn)
                .map_err(|e| StoreError::query(format!("Failed to count classic results: {}", e)))
        })
    }

    /// Computes win/loss counts and the guess distribution of winning games.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn classic_summary(&self) -> Result<ClassicSummary, StoreError> {
        debug!("Computing classic summary");
        let results = self.find_classic(ClassicQuery::all())?;
        let summary = ClassicSummary::from_results(&results);

        info!(
            played = summary.played(),
            wins = summary.wins(),
            losses = summary.losses(),
            win_rate = %format!("{:.1}%", summary.win_rate()),
            "Classic summary computed"
        );
        Ok(summary)
    }

    /// Stores a daily result, replacing any record with the same guess count.
    ///
    /// # Errors
    ///
    /// Returns a `WriteFailure` [`StoreError`] if the write is rejected.
    #[instrument(skip(self), fields(guesses = result.guesses()))]
    pub fn put_daily(&self, result: DailyResult) -> Result<DailyResult, StoreError> {
        debug!("Storing daily result");
        self.with_connection(|conn| {
            diesel::replace_into(schema::daily::table)
                .values(&result)
                .execute(conn)
                .map_err(|e| StoreError::write(format!("Failed to store daily result: {}", e)))
        })?;

        info!(guesses = result.guesses(), "Daily result stored");
        Ok(result)
    }

    /// Gets the daily result keyed by `guesses`. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn get_daily(&self, guesses: i32) -> Result<Option<DailyResult>, StoreError> {
        debug!(guesses = %guesses, "Looking up daily result");
        self.with_connection(|conn| {
            schema::daily::table
                .find(guesses)
                .select(DailyResult::as_select())
                .first(conn)
                .optional()
                .map_err(|e| StoreError::query(format!("Failed to load daily result: {}", e)))
        })
    }

    /// Lists daily results ordered by guess count.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn list_daily(&self) -> Result<Vec<DailyResult>, StoreError> {
        self.with_connection(|conn| {
            schema::daily::table
                .order(schema::daily::guesses.asc())
                .select(DailyResult::as_select())
                .load(conn)
                .map_err(|e| StoreError::query(format!("Failed to list daily results: {}", e)))
        })
    }

    /// Counts daily results.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn count_daily(&self) -> Result<i64, StoreError> {
        self.with_connection(|conn| {
            schema::daily::table
                .count()
                .get_result(conn)
                .map_err(|e| StoreError::query(format!("Failed to count daily results: {}", e)))
        })
    }

    /// Stores a statistic, replacing any previous value under the same name.
    ///
    /// # Errors
    ///
    /// Returns a `WriteFailure` [`StoreError`] if the write is rejected.
    #[instrument(skip(self, stat), fields(name = %stat.name(), value = stat.value()))]
    pub fn put_stat(&self, stat: Stat) -> Result<Stat, StoreError> {
        debug!("Storing stat");
        self.with_connection(|conn| {
            diesel::replace_into(schema::stats::table)
                .values(&stat)
                .execute(conn)
                .map_err(|e| StoreError::write(format!("Failed to store stat: {}", e)))
        })?;

        info!(name = %stat.name(), value = stat.value(), "Stat stored");
        Ok(stat)
    }

    /// Adds `delta` to the named statistic, treating a missing one as zero.
    ///
    /// # Errors
    ///
    /// Returns a `WriteFailure` [`StoreError`] if the transaction is rejected.
    #[instrument(skip(self))]
    pub fn increment_stat(&self, name: &str, delta: f64) -> Result<Stat, StoreError> {
        debug!(name = %name, delta = %delta, "Incrementing stat");
        let stat = self.with_connection(|conn| {
            conn.immediate_transaction::<_, diesel::result::Error, _>(|conn| {
                let current: Option<f64> = schema::stats::table
                    .find(name)
                    .select(schema::stats::value)
                    .first(conn)
                    .optional()?;

                let stat = Stat::new(name.to_string(), current.unwrap_or(0.0) + delta);
                diesel::replace_into(schema::stats::table)
                    .values(&stat)
                    .execute(conn)?;
                Ok(stat)
            })
            .map_err(|e| StoreError::write(format!("Failed to increment stat '{}': {}", name, e)))
        })?;

        info!(name = %stat.name(), value = stat.value(), "Stat incremented");
        Ok(stat)
    }

    /// Gets a statistic by name. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn get_stat(&self, name: &str) -> Result<Option<Stat>, StoreError> {
        debug!(name = %name, "Looking up stat");
        let stat = self.with_connection(|conn| {
            schema::stats::table
                .find(name)
                .select(Stat::as_select())
                .first(conn)
                .optional()
                .map_err(|e| StoreError::query(format!("Failed to load stat '{}': {}", name, e)))
        })?;

        if stat.is_none() {
            debug!("Stat not found");
        }
        Ok(stat)
    }

    /// Lists statistics ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn list_stats(&self) -> Result<Vec<Stat>, StoreError> {
        self.with_connection(|conn| {
            schema::stats::table
                .order(schema::stats::name.asc())
                .select(Stat::as_select())
                .load(conn)
                .map_err(|e| StoreError::query(format!("Failed to list stats: {}", e)))
        })
    }

    /// Lists up to `limit` statistics with the highest values first.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn top_stats(&self, limit: i64) -> Result<Vec<Stat>, StoreError> {
        self.with_connection(|conn| {
            schema::stats::table
                .order((schema::stats::value.desc(), schema::stats::name.asc()))
                .limit(limit)
                .select(Stat::as_select())
                .load(conn)
                .map_err(|e| StoreError::query(format!("Failed to rank stats: {}", e)))
        })
    }

    /// Counts statistics.
    ///
    /// # Errors
    ///
    /// Returns a `QueryFailure` [`StoreError`] if the read is rejected.
    #[instrument(skip(self))]
    pub fn count_stats(&self) -> Result<i64, StoreError> {
        self.with_connection(|conn| {
            schema::stats::table
                .count()
                .get_result(conn)
                .map_err(|e| StoreError::query(format!("Failed to count stats: {}", e)))
        })
    }
}

/// Builds the classic table query restricted to `query`'s indexed fields.
fn filtered_classic(query: &ClassicQuery) -> schema::classic::BoxedQuery<'static, Sqlite> {
    let mut statement = schema::classic::table.into_boxed();
    if let Some(win) = *query.win() {
        statement = statement.filter(schema::classic::win.eq(win));
    }
    if let Some(guesses) = *query.guesses() {
        statement = statement.filter(schema::classic::guesses.eq(guesses));
    }
    statement
}

fn read_user_version(conn: &mut SqliteConnection) -> QueryResult<i32> {
    diesel::sql_query("PRAGMA user_version")
        .get_result::<UserVersion>(conn)
        .map(|row| row.user_version)
}

fn engine_objects(conn: &mut SqliteConnection, kind: &str) -> Result<HashSet<String>, StoreError> {
    diesel::sql_query("SELECT name FROM sqlite_master WHERE type = ?")
        .bind::<Text, _>(kind)
        .load::<MasterEntry>(conn)
        .map(|rows| rows.into_iter().map(|row| row.name).collect())
        .map_err(|e| StoreError::unavailable(format!("Failed to inspect schema: {}", e)))
}

/// Declares [`DATABASE_SCHEMA`] on a freshly opened connection.
#[instrument(skip(conn))]
fn initialize_schema(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let stored = read_user_version(conn).map_err(|e| {
        StoreError::unavailable(format!("Failed to read schema version: {}", e))
    })?;
    debug!(
        stored,
        expected = DATABASE_SCHEMA.version,
        "Checking schema version"
    );

    if stored > DATABASE_SCHEMA.version {
        warn!(
            stored,
            expected = DATABASE_SCHEMA.version,
            "Database schema is newer than supported"
        );
        return Err(StoreError::unavailable(format!(
            "Database '{}' is at schema version {}, this build supports {}",
            DATABASE_SCHEMA.name, stored, DATABASE_SCHEMA.version
        )));
    }

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StoreError::unavailable(format!("Schema initialization failed: {}", e)))?;
    if !applied.is_empty() {
        info!(count = applied.len(), "Applied schema migrations");
    }

    if stored < DATABASE_SCHEMA.version {
        let stamp = format!("PRAGMA user_version = {};", DATABASE_SCHEMA.version);
        conn.batch_execute(&stamp).map_err(|e| {
            StoreError::unavailable(format!("Failed to stamp schema version: {}", e))
        })?;
    }

    verify_schema(conn)
}

/// Checks that every declared collection and index exists in the engine.
#[instrument(skip(conn))]
fn verify_schema(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let tables = engine_objects(conn, "table")?;
    let indexes = engine_objects(conn, "index")?;

    for collection in DATABASE_SCHEMA.collections {
        let name = collection.collection.as_ref();
        if !tables.contains(name) {
            return Err(StoreError::unavailable(format!(
                "Schema mismatch: collection '{}' is missing",
                name
            )));
        }
        for index in collection.index_names() {
            if !indexes.contains(&index) {
                return Err(StoreError::unavailable(format!(
                    "Schema mismatch: index '{}' is missing",
                    index
                )));
            }
        }
        debug!(collection = %name, keys = %collection.declaration(), "Collection verified");
    }
    Ok(())
}
