//! Declarative layout of the result database.
//!
//! The layout is the persisted contract: database name, schema version,
//! collection names and index field lists. Opening a store checks the engine
//! against [`DATABASE_SCHEMA`] after migrations have run.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::instrument;

/// The named collections in the result database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, AsRefStr, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Named numeric statistics.
    Stats,
    /// Classic-mode game outcomes.
    Classic,
    /// Daily-mode game outcomes.
    Daily,
}

/// How a collection identifies its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrimaryKey {
    /// Engine-assigned, strictly increasing integer stored in the named column.
    AutoIncrement(&'static str),
    /// Caller-supplied value of the named field. Writes upsert.
    Field(&'static str),
}

impl PrimaryKey {
    /// Column holding the key.
    pub fn column(&self) -> &'static str {
        match self {
            Self::AutoIncrement(column) | Self::Field(column) => column,
        }
    }
}

/// Schema of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionSchema {
    /// Collection (and table) name.
    pub collection: Collection,
    /// Primary key specification.
    pub primary_key: PrimaryKey,
    /// Secondary index fields, in declaration order.
    pub indexes: &'static [&'static str],
}

impl CollectionSchema {
    /// Name of the engine index backing `field`.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub fn index_name(&self, field: &str) -> String {
        format!("{}_{}", self.collection, field)
    }

    /// All engine index names this collection must carry.
    pub fn index_names(&self) -> Vec<String> {
        self.indexes.iter().map(|f| self.index_name(f)).collect()
    }

    /// Compact key list: primary key first, `++` for auto keys.
    ///
    /// `classic` renders as `++, win, guesses`.
    pub fn declaration(&self) -> String {
        let key = match self.primary_key {
            PrimaryKey::AutoIncrement(_) => "++",
            PrimaryKey::Field(field) => field,
        };
        std::iter::once(key)
            .chain(self.indexes.iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A versioned set of collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseSchema {
    /// Logical database name.
    pub name: &'static str,
    /// Schema version stamped into the engine.
    pub version: i32,
    /// Collections in declaration order.
    pub collections: &'static [CollectionSchema],
}

impl DatabaseSchema {
    /// Looks up the schema of a collection.
    pub fn collection(&self, collection: Collection) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.collection == collection)
    }
}

/// Version 1 of the result database.
pub const DATABASE_SCHEMA: DatabaseSchema = DatabaseSchema {
    name: "database",
    version: 1,
    collections: &[
        CollectionSchema {
            collection: Collection::Stats,
            primary_key: PrimaryKey::Field("name"),
            indexes: &["value"],
        },
        CollectionSchema {
            collection: Collection::Classic,
            primary_key: PrimaryKey::AutoIncrement("id"),
            indexes: &["win", "guesses"],
        },
        CollectionSchema {
            collection: Collection::Daily,
            primary_key: PrimaryKey::Field("guesses"),
            indexes: &[],
        },
    ],
};

/// Every collection, in declaration order.
pub fn collections() -> impl Iterator<Item = Collection> {
    Collection::iter()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_match_persisted_layout() {
        let rendered: Vec<String> = DATABASE_SCHEMA
            .collections
            .iter()
            .map(|c| format!("{}: {}", c.collection, c.declaration()))
            .collect();
        let expected = vec![
            "stats: name, value",
            "classic: ++, win, guesses",
            "daily: guesses",
        ];
        assert_eq!(rendered, expected);
    }

    #[test]
    fn every_collection_is_declared() {
        for collection in collections() {
            assert!(DATABASE_SCHEMA.collection(collection).is_some());
        }
    }

    #[test]
    fn index_names_are_prefixed_by_collection() {
        let classic = DATABASE_SCHEMA
            .collection(Collection::Classic)
            .expect("classic declared");
        assert_eq!(classic.index_names(), vec!["classic_win", "classic_guesses"]);
        let daily = DATABASE_SCHEMA
            .collection(Collection::Daily)
            .expect("daily declared");
        assert!(daily.index_names().is_empty());
    }

    #[test]
    fn collection_names_parse() {
        assert_eq!("classic".parse::<Collection>(), Ok(Collection::Classic));
        assert!("weekly".parse::<Collection>().is_err());
    }
}
