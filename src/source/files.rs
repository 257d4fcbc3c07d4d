//! JSON export on disk: one `<collection>.json` per collection.

use super::{Collection, ContentSource, SourceError};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Reads `<dir>/works.json`, `<dir>/categories.json`, ...
///
/// Files hold the records in the same camelCase shape the CMS serves, so an
/// export of GraphQL results can be dropped in as is.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ContentSource for FileSource {
    fn fetch(&self, collection: Collection) -> Result<Value, SourceError> {
        let path = self.dir.join(format!("{}.json", collection.name()));
        if !path.exists() {
            if collection.is_required() {
                return Err(SourceError::Query {
                    collection,
                    message: format!("{} not found", path.display()),
                });
            }
            return Ok(Value::Null);
        }
        let content = fs::read_to_string(&path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SourceError::Decode { collection, source })
    }
}
