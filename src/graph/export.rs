use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::GraphIoError;

/// A node in the exported graph file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedNode {
    pub id: String,
}

/// A labeled link in the exported graph file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExportedLink {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub label: String,
}

/// Portable node/link representation of a knowledge graph:
/// `{"nodes": [{"id"}], "links": [{"source", "target", "label"}]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExportedGraph {
    pub nodes: Vec<ExportedNode>,
    pub links: Vec<ExportedLink>,
}

impl ExportedGraph {
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id.clone()).collect()
    }

    /// Write as pretty-printed JSON, creating missing parent directories
    pub fn write_to(&self, path: &Path) -> Result<(), GraphIoError> {
        write_json(path, self)
    }

    pub fn read_from(path: &Path) -> Result<Self, GraphIoError> {
        read_json(path)
    }
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), GraphIoError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| GraphIoError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| GraphIoError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, GraphIoError> {
    let content = std::fs::read_to_string(path).map_err(|source| GraphIoError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| GraphIoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
