//! Input dataset supplied by the host.
//!
//! The shape mirrors the analysis backend's JSON:
//!
//! ```text
//! { nodes: [{ id, data: { message, author, date, branch, is_initial, is_merge, files_changed } }],
//!   edges: [{ source, target }] }
//! ```
//!
//! Edges point from parent commit to child commit.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Branch name used when a commit carries none.
pub const DEFAULT_BRANCH: &str = "main";

/// Semantic payload of one commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitData {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: String,
    /// ISO-8601 timestamp, with or without offset.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub is_initial: bool,
    /// Absent means "derive from parent count".
    #[serde(default)]
    pub is_merge: Option<bool>,
    #[serde(default)]
    pub files_changed: Vec<String>,
}

impl CommitData {
    /// Branch this commit belongs to, defaulting to [`DEFAULT_BRANCH`].
    pub fn branch(&self) -> &str {
        match self.branch.as_deref() {
            Some(b) if !b.is_empty() => b,
            _ => DEFAULT_BRANCH,
        }
    }

    pub fn is_merge(&self) -> bool {
        self.is_merge.unwrap_or(false)
    }

    /// First line of the commit message, shortened for labels.
    pub fn summary(&self) -> String {
        let first = self.message.lines().next().unwrap_or("").trim();
        if first.chars().count() > 48 {
            let mut short: String = first.chars().take(45).collect();
            short.push_str("...");
            short
        } else {
            first.to_string()
        }
    }

    /// Parse the commit date into milliseconds since the Unix epoch.
    pub fn timestamp_millis(&self, node: &str) -> Result<i64> {
        parse_timestamp(&self.date).ok_or_else(|| GraphError::MalformedDate {
            node: node.to_string(),
            value: self.date.clone(),
        })
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one interpreted as UTC.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Format a millisecond timestamp as a calendar date for axis labels.
pub fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// One commit node in the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub data: CommitData,
}

/// A parent → child link in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
}

/// Complete input: commit nodes and parent links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl Dataset {
    /// Build a dataset and derive missing merge flags.
    pub fn new(nodes: Vec<NodeRecord>, edges: Vec<EdgeRecord>) -> Self {
        let mut dataset = Self { nodes, edges };
        dataset.derive_merge_flags();
        dataset
    }

    /// Parse the host JSON. Both collections must be present.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| GraphError::InvalidDataset(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validate and convert an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| GraphError::InvalidDataset("expected an object".into()))?;
        for field in ["nodes", "edges"] {
            match object.get(field) {
                Some(serde_json::Value::Array(_)) => {}
                Some(_) => {
                    return Err(GraphError::InvalidDataset(format!("`{field}` must be an array")));
                }
                None => return Err(GraphError::InvalidDataset(format!("missing `{field}`"))),
            }
        }
        let dataset: Dataset = serde_json::from_value(value)
            .map_err(|e| GraphError::InvalidDataset(e.to_string()))?;
        Ok(Self::new(dataset.nodes, dataset.edges))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a commit by id.
    pub fn commit(&self, id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node indices sorted by timestamp ascending (stable for equal times),
    /// paired with their parsed timestamps.
    pub fn chronological(&self) -> Result<Vec<(usize, i64)>> {
        let mut order = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| n.data.timestamp_millis(&n.id).map(|t| (i, t)))
            .collect::<Result<Vec<_>>>()?;
        order.sort_by_key(|&(_, t)| t);
        Ok(order)
    }

    /// Distinct branch names in order of first appearance.
    pub fn branches(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for node in &self.nodes {
            let branch = node.data.branch();
            if !seen.iter().any(|b| b == branch) {
                seen.push(branch.to_string());
            }
        }
        seen
    }

    fn derive_merge_flags(&mut self) {
        let mut parents: HashMap<&str, usize> = HashMap::new();
        for edge in &self.edges {
            *parents.entry(edge.target.as_str()).or_insert(0) += 1;
        }
        let derived: Vec<bool> = self
            .nodes
            .iter()
            .map(|n| parents.get(n.id.as_str()).copied().unwrap_or(0) > 1)
            .collect();
        for (node, merge) in self.nodes.iter_mut().zip(derived) {
            if node.data.is_merge.is_none() {
                node.data.is_merge = Some(merge);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn commit(id: &str, branch: &str, date: &str) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            data: CommitData {
                message: format!("commit {id}"),
                author: "alice".to_string(),
                date: date.to_string(),
                branch: Some(branch.to_string()),
                is_initial: false,
                is_merge: None,
                files_changed: vec![format!("src/{id}.rs")],
            },
        }
    }

    pub fn edge(source: &str, target: &str) -> EdgeRecord {
        EdgeRecord {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// `init -> a -> m`, `init -> m`: three commits on main, `m` a merge.
    pub fn merge_triangle() -> Dataset {
        let mut init = commit("init", "main", "2024-01-01T10:00:00Z");
        init.data.is_initial = true;
        Dataset::new(
            vec![
                init,
                commit("a", "main", "2024-01-02T10:00:00Z"),
                commit("m", "main", "2024-01-03T10:00:00Z"),
            ],
            vec![edge("init", "a"), edge("a", "m"), edge("init", "m")],
        )
    }

    /// Two branches: four commits on main, two on feature.
    pub fn two_branches() -> Dataset {
        let mut init = commit("c0", "main", "2024-01-01T00:00:00Z");
        init.data.is_initial = true;
        Dataset::new(
            vec![
                init,
                commit("c1", "main", "2024-01-02T00:00:00Z"),
                commit("f1", "feature", "2024-01-03T00:00:00Z"),
                commit("c2", "main", "2024-01-04T00:00:00Z"),
                commit("f2", "feature", "2024-01-05T00:00:00Z"),
                commit("c3", "main", "2024-01-06T00:00:00Z"),
            ],
            vec![
                edge("c0", "c1"),
                edge("c1", "f1"),
                edge("c1", "c2"),
                edge("f1", "f2"),
                edge("c2", "c3"),
                edge("f2", "c3"),
            ],
        )
    }
}
