//! Native graph snapshots
//!
//! Layout: a gzip stream holding an 8-byte magic, a bincode `SnapshotHeader`
//! and a bincode `SnapshotBody`. Magic and header are checked before the
//! body is decoded.

use super::{write_atomic, PersistenceError, PersistenceResult};
use crate::graph::{Edge, Node, SocialGraph};
use chrono::{SecondsFormat, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Write};
use std::path::Path;
use tracing::info;

const SNAPSHOT_MAGIC: [u8; 8] = *b"WILDSNAP";

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    version: u32,
    /// RFC 3339 creation time
    created_at: String,
    node_count: u64,
    edge_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotBody {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Metadata of a written or loaded snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInfo {
    pub version: u32,
    pub created_at: String,
    pub node_count: usize,
    pub edge_count: usize,
}

impl From<&SnapshotHeader> for SnapshotInfo {
    fn from(header: &SnapshotHeader) -> Self {
        Self {
            version: header.version,
            created_at: header.created_at.clone(),
            node_count: header.node_count as usize,
            edge_count: header.edge_count as usize,
        }
    }
}

/// Save `graph` as a compressed snapshot
pub fn save_snapshot(graph: &SocialGraph, path: impl AsRef<Path>) -> PersistenceResult<SnapshotInfo> {
    let path = path.as_ref();
    let header = SnapshotHeader {
        version: SNAPSHOT_VERSION,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        node_count: graph.node_count() as u64,
        edge_count: graph.edge_count() as u64,
    };
    let body = SnapshotBody {
        nodes: graph.nodes().cloned().collect(),
        edges: graph.edges().cloned().collect(),
    };

    write_atomic(path, |w| {
        let mut encoder = GzEncoder::new(w, Compression::default());
        encoder.write_all(&SNAPSHOT_MAGIC).map_err(PersistenceError::io(path))?;
        bincode::serialize_into(&mut encoder, &header)?;
        bincode::serialize_into(&mut encoder, &body)?;
        encoder.finish().map_err(PersistenceError::io(path))?;
        Ok(())
    })?;

    info!(
        "Saved snapshot with {} nodes and {} edges to {:?}",
        header.node_count, header.edge_count, path
    );
    Ok(SnapshotInfo::from(&header))
}

/// Load a snapshot written by [`save_snapshot`]
pub fn load_snapshot(path: impl AsRef<Path>) -> PersistenceResult<(SocialGraph, SnapshotInfo)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(PersistenceError::io(path))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));

    let mut magic = [0u8; 8];
    match decoder.read_exact(&mut magic) {
        Ok(()) if magic == SNAPSHOT_MAGIC => {}
        Ok(()) => return Err(PersistenceError::BadMagic),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Err(PersistenceError::BadMagic),
        Err(source) => {
            return Err(PersistenceError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let header: SnapshotHeader = bincode::deserialize_from(&mut decoder)?;
    if header.version != SNAPSHOT_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            found: header.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    let body: SnapshotBody = bincode::deserialize_from(&mut decoder)?;
    let graph = SocialGraph::from_parts(body.nodes, body.edges);
    if graph.node_count() != header.node_count as usize || graph.edge_count() != header.edge_count as usize {
        return Err(PersistenceError::Format(format!(
            "snapshot header announces {} nodes / {} edges, body holds {} / {}",
            header.node_count,
            header.edge_count,
            graph.node_count(),
            graph.edge_count()
        )));
    }

    info!(
        "Loaded snapshot ({}) with {} nodes and {} edges from {:?}",
        header.created_at,
        graph.node_count(),
        graph.edge_count(),
        path
    );
    Ok((graph, SnapshotInfo::from(&header)))
}
