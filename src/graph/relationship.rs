use serde::{Deserialize, Serialize};
use std::fmt;

/// A (subject, relation, object) fact extracted from one passage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triple {
    pub fn new(subject: &str, relation: &str, object: &str) -> Self {
        Self {
            subject: subject.to_string(),
            relation: relation.to_string(),
            object: object.to_string(),
        }
    }

    /// Build a triple from raw parts, trimming whitespace.
    /// Returns `None` when any part is blank.
    pub fn from_parts(subject: &str, relation: &str, object: &str) -> Option<Self> {
        let (subject, relation, object) = (subject.trim(), relation.trim(), object.trim());
        if subject.is_empty() || relation.is_empty() || object.is_empty() {
            return None;
        }
        Some(Self::new(subject, relation, object))
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) -[{}]-> ({})", self.subject, self.relation, self.object)
    }
}

/// A labeled edge as seen from outside the graph store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabeledEdge {
    pub source: String,
    pub target: String,
    pub label: String,
}
