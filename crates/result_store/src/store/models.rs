//! Record shapes stored in each collection.

use std::collections::BTreeMap;

use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::store::schema;

/// Outcome of one completed classic-mode game.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::classic)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ClassicResult {
    id: i32,
    win: bool,
    guesses: i32,
}

/// Insertable classic result. The engine assigns the id.
#[derive(Debug, Clone, Copy, Insertable, new, Getters)]
#[diesel(table_name = schema::classic)]
pub struct NewClassicResult {
    win: bool,
    guesses: i32,
}

/// Outcome of the daily-mode game, keyed by its guess count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Queryable, Selectable, Insertable, new, Getters, Serialize,
)]
#[diesel(table_name = schema::daily)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyResult {
    guesses: i32,
}

/// A named numeric statistic.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, new, Getters, Serialize)]
#[diesel(table_name = schema::stats)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Stat {
    name: String,
    value: f64,
}

/// Filter over the indexed fields of the classic collection.
///
/// Unset fields match every record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Getters)]
pub struct ClassicQuery {
    win: Option<bool>,
    guesses: Option<i32>,
}

impl ClassicQuery {
    /// Matches every classic result.
    #[instrument]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches winning games only.
    #[instrument]
    pub fn wins() -> Self {
        Self::default().with_win(true)
    }

    /// Matches lost games only.
    #[instrument]
    pub fn losses() -> Self {
        Self::default().with_win(false)
    }

    /// Restricts the query to games with the given outcome.
    #[instrument]
    pub fn with_win(mut self, win: bool) -> Self {
        self.win = Some(win);
        self
    }

    /// Restricts the query to games finished in exactly `guesses` guesses.
    #[instrument]
    pub fn with_guesses(mut self, guesses: i32) -> Self {
        self.guesses = Some(guesses);
        self
    }
}

/// Aggregate view over the classic collection.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize)]
pub struct ClassicSummary {
    played: i64,
    wins: i64,
    losses: i64,
    /// Number of winning games per guess count.
    guess_distribution: BTreeMap<i32, i64>,
}

impl ClassicSummary {
    /// Builds a summary from classic results.
    #[instrument(skip(results), fields(count = results.len()))]
    pub fn from_results(results: &[ClassicResult]) -> Self {
        let mut wins = 0;
        let mut guess_distribution = BTreeMap::new();

        for result in results.iter().filter(|r| r.win) {
            wins += 1;
            *guess_distribution.entry(result.guesses).or_insert(0) += 1;
        }

        let played = results.len() as i64;
        Self {
            played,
            wins,
            losses: played - wins,
            guess_distribution,
        }
    }

    /// Win rate as a percentage (0.0–100.0).
    #[instrument(skip(self))]
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            0.0
        } else {
            (self.wins as f64 / self.played as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: i32, win: bool, guesses: i32) -> ClassicResult {
        ClassicResult { id, win, guesses }
    }

    #[test]
    fn summary_counts_only_wins_in_distribution() {
        let summary = ClassicSummary::from_results(&[
            result(1, true, 3),
            result(2, true, 3),
            result(3, false, 6),
            result(4, true, 5),
        ]);
        assert_eq!(*summary.played(), 4);
        assert_eq!(*summary.wins(), 3);
        assert_eq!(*summary.losses(), 1);
        assert_eq!(summary.guess_distribution().get(&3), Some(&2));
        assert_eq!(summary.guess_distribution().get(&5), Some(&1));
        assert_eq!(summary.guess_distribution().get(&6), None);
        assert!((summary.win_rate() - 75.0).abs() < 0.001);
    }

    #[test]
    fn empty_summary_has_zero_win_rate() {
        let summary = ClassicSummary::from_results(&[]);
        assert_eq!(*summary.played(), 0);
        assert_eq!(summary.win_rate(), 0.0);
    }

    #[test]
    fn query_builders_set_fields() {
        assert_eq!(*ClassicQuery::wins().win(), Some(true));
        assert_eq!(*ClassicQuery::losses().with_guesses(4).guesses(), Some(4));
        assert_eq!(ClassicQuery::all(), ClassicQuery::default());
    }
}
