//! Table sources
//!
//! The pipeline consumes already-materialized row sets. Where they come from
//! is up to the `DataSource` implementation: JSON / JSON Lines files on disk,
//! or rows held in memory.

use super::records::{ActivityLink, Connection, ContentRecord, Profile};
use super::validate::{validate_content, validate_rows, ContentBatch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Data access errors. All of them are fatal for a run.
#[derive(Error, Debug)]
pub enum DataError {
    /// Input table file does not exist
    #[error("input table not found: {0}")]
    MissingTable(PathBuf),

    /// I/O error
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A row could not be decoded into its record type
    #[error("malformed row in {path} (line {line}): {source}")]
    Decode {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// File extension is neither `.json` nor `.jsonl` / `.ndjson`
    #[error("unsupported table format: {0}")]
    UnsupportedFormat(PathBuf),
}

pub type DataResult<T> = Result<T, DataError>;

/// Locations of the four input tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPaths {
    pub profiles: PathBuf,
    pub connections: PathBuf,
    pub activity_links: PathBuf,
    pub content: PathBuf,
}

impl Default for InputPaths {
    fn default() -> Self {
        Self {
            profiles: PathBuf::from("data/profiles.jsonl"),
            connections: PathBuf::from("data/profile_connections.jsonl"),
            activity_links: PathBuf::from("data/profile_activity.jsonl"),
            content: PathBuf::from("data/translated_posts.jsonl"),
        }
    }
}

impl InputPaths {
    /// Resolve relative paths against `base`
    pub fn relative_to(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| if p.is_absolute() { p.clone() } else { base.join(p) };
        Self {
            profiles: join(&self.profiles),
            connections: join(&self.connections),
            activity_links: join(&self.activity_links),
            content: join(&self.content),
        }
    }
}

/// Supplies the raw tables consumed by the pipeline
pub trait DataSource {
    fn profiles(&self) -> DataResult<Vec<Profile>>;
    fn connections(&self) -> DataResult<Vec<Connection>>;
    fn activity_links(&self) -> DataResult<Vec<ActivityLink>>;
    /// Enrichment records, already validated record by record
    fn content(&self) -> DataResult<ContentBatch>;
}

/// Reads tables from JSON (array of objects) or JSON Lines files
#[derive(Debug, Clone)]
pub struct JsonTableSource {
    paths: InputPaths,
}

impl JsonTableSource {
    pub fn new(paths: InputPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &InputPaths {
        &self.paths
    }
}

impl DataSource for JsonTableSource {
    fn profiles(&self) -> DataResult<Vec<Profile>> {
        read_table(&self.paths.profiles)
    }

    fn connections(&self) -> DataResult<Vec<Connection>> {
        read_table(&self.paths.connections)
    }

    fn activity_links(&self) -> DataResult<Vec<ActivityLink>> {
        read_table(&self.paths.activity_links)
    }

    fn content(&self) -> DataResult<ContentBatch> {
        Ok(validate_rows(read_content_rows(&self.paths.content)?))
    }
}

/// Rows held in memory; content stays raw so it is validated like file input
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    pub profiles: Vec<Profile>,
    pub connections: Vec<Connection>,
    pub activity_links: Vec<ActivityLink>,
    pub content: Vec<serde_json::Value>,
}

impl InMemorySource {
    pub fn new(
        profiles: Vec<Profile>,
        connections: Vec<Connection>,
        activity_links: Vec<ActivityLink>,
        content: Vec<serde_json::Value>,
    ) -> Self {
        Self {
            profiles,
            connections,
            activity_links,
            content,
        }
    }

    /// Build from typed content records
    pub fn with_records(
        profiles: Vec<Profile>,
        connections: Vec<Connection>,
        activity_links: Vec<ActivityLink>,
        content: &[ContentRecord],
    ) -> Self {
        let raw = content
            .iter()
            .filter_map(|r| serde_json::to_value(r).ok())
            .collect();
        Self::new(profiles, connections, activity_links, raw)
    }
}

impl DataSource for InMemorySource {
    fn profiles(&self) -> DataResult<Vec<Profile>> {
        Ok(self.profiles.clone())
    }

    fn connections(&self) -> DataResult<Vec<Connection>> {
        Ok(self.connections.clone())
    }

    fn activity_links(&self) -> DataResult<Vec<ActivityLink>> {
        Ok(self.activity_links.clone())
    }

    fn content(&self) -> DataResult<ContentBatch> {
        Ok(validate_content(self.content.clone()))
    }
}

enum TableFormat {
    JsonArray,
    JsonLines,
}

fn table_format(path: &Path) -> DataResult<TableFormat> {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "json" => Ok(TableFormat::JsonArray),
        Some(ext) if ext == "jsonl" || ext == "ndjson" => Ok(TableFormat::JsonLines),
        _ => Err(DataError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn open_table(path: &Path) -> DataResult<BufReader<File>> {
    if !path.exists() {
        return Err(DataError::MissingTable(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Read one table file into typed rows
pub fn read_table<T: DeserializeOwned>(path: &Path) -> DataResult<Vec<T>> {
    let format = table_format(path)?;
    let reader = open_table(path)?;
    let io_err = |source| DataError::Io {
        path: path.to_path_buf(),
        source,
    };

    let rows: Vec<T> = match format {
        TableFormat::JsonArray => serde_json::from_reader(reader).map_err(|source| DataError::Decode {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        })?,
        TableFormat::JsonLines => {
            let mut rows = Vec::new();
            for (n, line) in reader.lines().enumerate() {
                let line = line.map_err(io_err)?;
                if line.trim().is_empty() {
                    continue;
                }
                let row = serde_json::from_str(&line).map_err(|source| DataError::Decode {
                    path: path.to_path_buf(),
                    line: n + 1,
                    source,
                })?;
                rows.push(row);
            }
            rows
        }
    };

    info!("Loaded {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Read the enrichment table as raw JSON rows.
///
/// In JSON Lines files a line that is not valid JSON becomes an `Err` row
/// instead of failing the table. A `.json` array must still parse as a whole.
fn read_content_rows(path: &Path) -> DataResult<Vec<Result<serde_json::Value, String>>> {
    let TableFormat::JsonLines = table_format(path)? else {
        let rows: Vec<serde_json::Value> = read_table(path)?;
        return Ok(rows.into_iter().map(Ok).collect());
    };

    let reader = open_table(path)?;
    let mut rows = Vec::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str(&line).map_err(|e| format!("line {}: {}", n + 1, e)));
    }

    info!("Loaded {} rows from {:?}", rows.len(), path);
    Ok(rows)
}
