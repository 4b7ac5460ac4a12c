//! Asynchronous handle over the result database.

use tracing::{debug, info, instrument};

use crate::{
    ClassicQuery, ClassicResult, ClassicSummary, DailyResult, NewClassicResult, ResultRepository,
    Stat, StoreConfig, StoreError,
};

/// Shared handle to the local result database.
///
/// Construct one with [`ResultStore::open`] at startup and hand clones to
/// whatever needs persistence. Every operation suspends the caller until the
/// engine has finished; the blocking work runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct ResultStore {
    repository: ResultRepository,
}

impl ResultStore {
    /// Opens the database described by `config`, creating its directory and
    /// declaring the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns a `StorageUnavailable` [`StoreError`] if the engine cannot be
    /// opened or initialized.
    #[instrument(skip(config), fields(database_url = %config.database_url()))]
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        if let Some(dir) = config.data_dir() {
            debug!(dir = %dir.display(), "Ensuring data directory");
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                let message = format!("Failed to create '{}': {}", dir.display(), e);
                return Err(StoreError::unavailable(message));
            }
        }

        let database_url = config.database_url();
        let busy_timeout = config.busy_timeout();
        let task = tokio::task::spawn_blocking(move || {
            ResultRepository::open(database_url, busy_timeout)
        });
        let repository = match task.await {
            Ok(opened) => opened?,
            Err(e) => return Err(StoreError::unavailable(format!("Open task failed: {}", e))),
        };

        info!("ResultStore ready");
        Ok(Self { repository })
    }

    /// Wraps an already opened repository.
    #[instrument(skip(repository))]
    pub fn new(repository: ResultRepository) -> Self {
        Self { repository }
    }

    /// Returns the underlying repository.
    #[instrument(skip(self))]
    pub fn repository(&self) -> &ResultRepository {
        &self.repository
    }

    /// Runs a repository operation on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&ResultRepository) -> Result<T, StoreError> + Send + 'static,
    {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || op(&repository))
            .await
            .map_err(|e| StoreError::unavailable(format!("Storage task failed: {}", e)))?
    }

    /// Schema version stamped in the engine.
    #[instrument(skip(self))]
    pub async fn schema_version(&self) -> Result<i32, StoreError> {
        self.run(|repo| repo.schema_version()).await
    }

    /// Records a completed classic game and returns it with its assigned id.
    #[instrument(skip(self))]
    pub async fn add_classic(&self, win: bool, guesses: i32) -> Result<ClassicResult, StoreError> {
        let new = NewClassicResult::new(win, guesses);
        self.run(move |repo| repo.insert_classic(new)).await
    }

    /// Gets a classic result by id.
    #[instrument(skip(self))]
    pub async fn get_classic(&self, id: i32) -> Result<Option<ClassicResult>, StoreError> {
        self.run(move |repo| repo.get_classic(id)).await
    }

    /// Lists classic results matching `query`, ordered by id.
    #[instrument(skip(self))]
    pub async fn find_classic(
        &self,
        query: ClassicQuery,
    ) -> Result<Vec<ClassicResult>, StoreError> {
        self.run(move |repo| repo.find_classic(query)).await
    }

    /// Counts classic results matching `query`.
    #[instrument(skip(self))]
    pub async fn count_classic(&self, query: ClassicQuery) -> Result<i64, StoreError> {
        self.run(move |repo| repo.count_classic(query)).await
    }

    /// Win/loss counts and guess distribution over all classic games.
    #[instrument(skip(self))]
    pub async fn classic_summary(&self) -> Result<ClassicSummary, StoreError> {
        self.run(|repo| repo.classic_summary()).await
    }

    /// Stores the daily result for `guesses`, replacing an existing one.
    #[instrument(skip(self))]
    pub async fn put_daily(&self, guesses: i32) -> Result<DailyResult, StoreError> {
        let result = DailyResult::new(guesses);
        self.run(move |repo| repo.put_daily(result)).await
    }

    /// Gets the daily result keyed by `guesses`.
    #[instrument(skip(self))]
    pub async fn get_daily(&self, guesses: i32) -> Result<Option<DailyResult>, StoreError> {
        self.run(move |repo| repo.get_daily(guesses)).await
    }

    /// Lists daily results ordered by guess count.
    #[instrument(skip(self))]
    pub async fn list_daily(&self) -> Result<Vec<DailyResult>, StoreError> {
        self.run(|repo| repo.list_daily()).await
    }

    /// Counts daily results.
    #[instrument(skip(self))]
    pub async fn count_daily(&self) -> Result<i64, StoreError> {
        self.run(|repo| repo.count_daily()).await
    }

    /// Sets the named statistic, replacing any previous value.
    #[instrument(skip(self, name), fields(name = %name.as_ref()))]
    pub async fn put_stat(&self, name: impl AsRef<str>, value: f64) -> Result<Stat, StoreError> {
        let stat = Stat::new(name.as_ref().to_string(), value);
        self.run(move |repo| repo.put_stat(stat)).await
    }

    /// Adds `delta` to the named statistic.
    #[instrument(skip(self, name), fields(name = %name.as_ref()))]
    pub async fn increment_stat(
        &self,
        name: impl AsRef<str>,
        delta: f64,
    ) -> Result<Stat, StoreError> {
        let name = name.as_ref().to_string();
        self.run(move |repo| repo.increment_stat(&name, delta))
            .await
    }

    /// Gets a statistic by name.
    #[instrument(skip(self, name), fields(name = %name.as_ref()))]
    pub async fn get_stat(&self, name: impl AsRef<str>) -> Result<Option<Stat>, StoreError> {
        let name = name.as_ref().to_string();
        self.run(move |repo| repo.get_stat(&name)).await
    }

    /// Lists statistics ordered by name.
    #[instrument(skip(self))]
    pub async fn list_stats(&self) -> Result<Vec<Stat>, StoreError> {
        self.run(|repo| repo.list_stats()).await
    }

    /// Lists up to `limit` statistics, highest value first.
    #[instrument(skip(self))]
    pub async fn top_stats(&self, limit: i64) -> Result<Vec<Stat>, StoreError> {
        self.run(move |repo| repo.top_stats(limit)).await
    }

    /// Counts statistics.
    #[instrument(skip(self))]
    pub async fn count_stats(&self) -> Result<i64, StoreError> {
        self.run(|repo| repo.count_stats()).await
    }
}
