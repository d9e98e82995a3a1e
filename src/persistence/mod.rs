//! Persistence layer
//!
//! Two on-disk forms of an annotated graph:
//! - GraphML, the portable attributed-graph format other tools read
//! - a gzip-compressed bincode snapshot for fast reload

pub mod graphml;
pub mod snapshot;

pub use graphml::{parse_graphml, read_graphml, to_graphml_string, write_graphml, write_graphml_to};
pub use snapshot::{load_snapshot, save_snapshot, SnapshotInfo, SNAPSHOT_VERSION};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// XML error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Structurally valid input that is not a graph we can load
    #[error("Malformed graph file: {0}")]
    Format(String),

    #[error("Not a wildnet snapshot")]
    BadMagic,

    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> PersistenceError + '_ {
        move |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write a file through a temporary sibling and rename it into place, so a
/// failed write never leaves a truncated file at `path`.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> PersistenceResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> PersistenceResult<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(PersistenceError::io(parent))?;
    }

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let result = (|| {
        let file = File::create(&tmp).map_err(PersistenceError::io(&tmp))?;
        let mut writer = BufWriter::new(file);
        write(&mut writer)?;
        writer.flush().map_err(PersistenceError::io(&tmp))?;
        writer.get_ref().sync_all().map_err(PersistenceError::io(&tmp))?;
        fs::rename(&tmp, path).map_err(PersistenceError::io(path))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    } else {
        debug!("Wrote {:?}", path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/file.txt");
        write_atomic(&path, |w| w.write_all(b"hello").map_err(PersistenceError::io(Path::new("x")))).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
        assert!(!path.with_file_name("file.txt.tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        let err = write_atomic(&path, |_| Err(PersistenceError::Format("boom".to_string())));
        assert!(err.is_err());
        assert!(!path.exists());
        assert!(!dir.path().join("file.txt.tmp").exists());
    }
}
