use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::GraphIoError;
use crate::graph::export::{read_json, write_json};

/// Names the classifier considers the same entity, with the chosen canonical
/// name. The canonical name need not appear among the aliases.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasGroup {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl AliasGroup {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// An alias that two groups tried to map to different canonical names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub alias: String,
    pub kept: String,
    pub rejected: String,
}

/// Alias name to canonical name. Names absent from the map are their own
/// canonical form. Serializes as a flat JSON object with sorted keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AliasMap {
    entries: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(|s| s.as_str())
    }

    /// Canonical form of `name`: its mapped value, or the name itself
    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Record every alias of `group`. The first canonical name recorded for
    /// an alias wins; later disagreements are returned as conflicts.
    pub fn record_group(&mut self, group: &AliasGroup) -> Vec<AliasConflict> {
        let canonical = group.canonical.trim();
        if canonical.is_empty() {
            tracing::warn!(
                "Ignoring alias group without a canonical name: {:?}",
                group.aliases
            );
            return Vec::new();
        }

        let mut conflicts = Vec::new();
        for alias in &group.aliases {
            let alias = alias.trim();
            if alias.is_empty() || alias == canonical {
                continue;
            }

            match self.entries.get(alias) {
                Some(existing) if existing == canonical => {}
                Some(existing) => conflicts.push(AliasConflict {
                    alias: alias.to_string(),
                    kept: existing.clone(),
                    rejected: canonical.to_string(),
                }),
                None => {
                    self.entries.insert(alias.to_string(), canonical.to_string());
                }
            }
        }
        conflicts
    }

    pub fn write_to(&self, path: &Path) -> Result<(), GraphIoError> {
        write_json(path, self)
    }

    pub fn read_from(path: &Path) -> Result<Self, GraphIoError> {
        read_json(path)
    }
}

impl FromIterator<(String, String)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
