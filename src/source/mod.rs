//! Content fetching: content store → snapshot.
//!
//! Stage 1 of the folio build pipeline. Every collection is read through a
//! [`ContentSource`], the reads fan out over the rayon pool, and the raw JSON
//! is decoded into a [`Snapshot`] only once all of them have come back.
//!
//! ```text
//! works ──────────┐
//! categories ─────┤
//! tags ───────────┤
//! histories ──────┼──▶ wait for all ──▶ decode ──▶ Snapshot
//! skills ─────────┤
//! certifications ─┤
//! profile ────────┘
//! ```
//!
//! If any read fails the whole fetch fails with the error of the first
//! failing collection in [`Collection::ALL`] order, so the reported error does
//! not depend on thread scheduling.

mod files;
mod graphql;

pub use files::FileSource;
pub use graphql::{GraphqlSource, extract_collection, paginate, query_for};

use crate::config::{SourceConfig, SourceKind};
use crate::types::Snapshot;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("query for {collection} failed: {message}")]
    Query {
        collection: Collection,
        message: String,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("cannot decode {collection}: {source}")]
    Decode {
        collection: Collection,
        source: serde_json::Error,
    },
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// One kind of record in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Works,
    Categories,
    Tags,
    Histories,
    Skills,
    Certifications,
    Profile,
}

impl Collection {
    /// Fetch order, which is also the order errors are reported in.
    pub const ALL: [Collection; 7] = [
        Self::Works,
        Self::Categories,
        Self::Tags,
        Self::Histories,
        Self::Skills,
        Self::Certifications,
        Self::Profile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Works => "works",
            Self::Categories => "categories",
            Self::Tags => "tags",
            Self::Histories => "histories",
            Self::Skills => "skills",
            Self::Certifications => "certifications",
            Self::Profile => "profile",
        }
    }

    /// Optional collections default to empty (or absent) when a source has
    /// nothing for them.
    pub fn is_required(self) -> bool {
        !matches!(self, Self::Certifications | Self::Profile)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Somewhere content records can be read from.
///
/// `fetch` returns the raw records of one collection: an array for list
/// collections, an object for [`Collection::Profile`]. `Value::Null` means
/// the source has nothing for that collection.
pub trait ContentSource: Sync {
    fn fetch(&self, collection: Collection) -> Result<Value, SourceError>;
}

/// Build the source described by `config`. Relative paths resolve against
/// `root`.
pub fn from_config(
    config: &SourceConfig,
    root: &Path,
) -> Result<Box<dyn ContentSource>, SourceError> {
    match config.kind {
        SourceKind::Files => Ok(Box::new(FileSource::new(root.join(&config.content_dir)))),
        SourceKind::Graphql => Ok(Box::new(GraphqlSource::new(&config.endpoint)?)),
    }
}

/// Read every collection and decode the results into a snapshot.
///
/// Reads run in parallel on the current rayon pool. Decoding starts only
/// after every read has returned.
pub fn fetch_snapshot<S: ContentSource + ?Sized>(source: &S) -> Result<Snapshot, SourceError> {
    let results: Vec<(Collection, Result<Value, SourceError>)> = Collection::ALL
        .par_iter()
        .map(|&collection| {
            tracing::debug!(%collection, "fetching collection");
            (collection, source.fetch(collection))
        })
        .collect();

    let mut raw = BTreeMap::new();
    for (collection, result) in results {
        let value = result?;
        if value.is_null() && collection.is_required() {
            return Err(SourceError::Query {
                collection,
                message: "returned no data".to_string(),
            });
        }
        raw.insert(collection, value);
    }

    let mut take = |collection: Collection| raw.remove(&collection).unwrap_or(Value::Null);
    let snapshot = Snapshot {
        works: decode_list(Collection::Works, take(Collection::Works))?,
        categories: decode_list(Collection::Categories, take(Collection::Categories))?,
        tags: decode_list(Collection::Tags, take(Collection::Tags))?,
        histories: decode_list(Collection::Histories, take(Collection::Histories))?,
        skills: decode_list(Collection::Skills, take(Collection::Skills))?,
        certifications: decode_list(Collection::Certifications, take(Collection::Certifications))?,
        profile: decode_optional(Collection::Profile, take(Collection::Profile))?,
    };

    tracing::info!(
        works = snapshot.works.len(),
        categories = snapshot.categories.len(),
        tags = snapshot.tags.len(),
        histories = snapshot.histories.len(),
        skills = snapshot.skills.len(),
        "fetched snapshot"
    );
    Ok(snapshot)
}

fn decode_list<T: DeserializeOwned>(
    collection: Collection,
    value: Value,
) -> Result<Vec<T>, SourceError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|source| SourceError::Decode { collection, source })
}

fn decode_optional<T: DeserializeOwned>(
    collection: Collection,
    value: Value,
) -> Result<Option<T>, SourceError> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| SourceError::Decode { collection, source })
}
