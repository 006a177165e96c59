//! Reads row files from disk and builds a snapshot.
//!
//! Each file holds a JSON array of objects. Organizations and locations are
//! required; the infra catalog and identifier files may be absent.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::rows::RawRow;
use super::{RecordStore, RowSources};
use crate::config::DataPaths;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path}: expected a JSON array of objects ({detail})")]
    Shape { path: PathBuf, detail: String },
}

/// Loads all four row sets and builds a fresh snapshot.
pub async fn load_store(paths: &DataPaths) -> Result<RecordStore, LoadError> {
    let sources = RowSources {
        organizations: load_rows(&paths.organizations).await?,
        locations: load_rows(&paths.locations).await?,
        infra: load_optional_rows(&paths.infra).await?,
        identifiers: load_optional_rows(&paths.identifiers).await?,
    };
    Ok(RecordStore::build(sources))
}

pub async fn load_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let rows = parse_rows(path, &content)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "rows_loaded");
    Ok(rows)
}

/// Like [`load_rows`], but a missing file yields no rows.
pub async fn load_optional_rows(path: &Path) -> Result<Vec<RawRow>, LoadError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::debug!(path = %path.display(), "optional row file absent");
        return Ok(Vec::new());
    }
    load_rows(path).await
}

pub fn parse_rows(path: &Path, content: &str) -> Result<Vec<RawRow>, LoadError> {
    let value: Value = serde_json::from_str(content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(items) = value else {
        return Err(LoadError::Shape {
            path: path.to_path_buf(),
            detail: "top-level value is not an array".into(),
        });
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(object) => Ok(RawRow::from_json_object(object)),
            _ => Err(LoadError::Shape {
                path: path.to_path_buf(),
                detail: format!("element {idx} is not an object"),
            }),
        })
        .collect()
}
