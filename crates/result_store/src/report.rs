//! Text and JSON views over stored records.

use derive_getters::Getters;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{
    ClassicQuery, ClassicResult, ClassicSummary, Collection, DATABASE_SCHEMA, DailyResult,
    ResultStore, Stat, StoreError,
};

/// Records of the selected collections, read in one pass.
///
/// Serializes as a single object keyed by collection name. Collections that
/// were not selected are absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize)]
pub struct Listing {
    /// Statistics, ordered by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<Vec<Stat>>,
    /// Classic results, ordered by id.
    #[serde(skip_serializing_if = "Option::is_none")]
    classic: Option<Vec<ClassicResult>>,
    /// Daily results, ordered by guess count.
    #[serde(skip_serializing_if = "Option::is_none")]
    daily: Option<Vec<DailyResult>>,
}

impl Listing {
    /// Reads every collection in `selected` from `store`.
    #[instrument(skip(store))]
    pub async fn load(store: &ResultStore, selected: &[Collection]) -> Result<Self, StoreError> {
        let mut listing = Self::default();
        for collection in selected {
            match collection {
                Collection::Stats => listing.stats = Some(store.list_stats().await?),
                Collection::Classic => {
                    let records = store.find_classic(ClassicQuery::all()).await?;
                    listing.classic = Some(records);
                }
                Collection::Daily => listing.daily = Some(store.list_daily().await?),
            }
        }
        debug!(collections = selected.len(), "Listing loaded");
        Ok(listing)
    }

    /// Pretty-printed JSON object keyed by collection name.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One line per record under a `[collection]` header.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(stats) = &self.stats {
            lines.push(format!("[{}]", Collection::Stats));
            for stat in stats {
                lines.push(format!("{} = {}", stat.name(), stat.value()));
            }
        }
        if let Some(classic) = &self.classic {
            lines.push(format!("[{}]", Collection::Classic));
            for game in classic {
                let (id, win, guesses) = (game.id(), game.win(), game.guesses());
                lines.push(format!("#{id} win={win} guesses={guesses}"));
            }
        }
        if let Some(daily) = &self.daily {
            lines.push(format!("[{}]", Collection::Daily));
            for result in daily {
                lines.push(format!("guesses={}", result.guesses()));
            }
        }
        lines.join("\n")
    }
}

/// Played, won and lost counts, the win rate, then the winning guess
/// distribution.
pub fn render_summary(summary: &ClassicSummary) -> String {
    let (played, wins, losses) = (summary.played(), summary.wins(), summary.losses());
    let rate = summary.win_rate();
    let mut lines = vec![
        format!("played {played} | won {wins} | lost {losses}"),
        format!("win rate {rate:.1}%"),
    ];
    for (guesses, count) in summary.guess_distribution() {
        lines.push(format!("{guesses:>3} guesses: {count}"));
    }
    lines.join("\n")
}

/// The persisted layout in `collection: keys` form.
pub fn render_schema() -> String {
    let (name, version) = (DATABASE_SCHEMA.name, DATABASE_SCHEMA.version);
    let mut lines = vec![format!("{name} (version {version})")];
    for schema in DATABASE_SCHEMA.collections {
        lines.push(format!("  {}: {}", schema.collection, schema.declaration()));
    }
    lines.join("\n")
}
