//! Natural-language analysis requests and their cache.
//!
//! The engine never talks to the summarizer itself. It queues
//! [`AnalysisRequest`]s for the host, and the host reports back with the
//! request id and the generation it was issued under. Anything answering an
//! older generation is dropped without complaint.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::data::NodeRecord;
use crate::expansion::BranchCluster;

/// Text shown when a summary cannot be produced.
pub const ANALYSIS_PLACEHOLDER: &str = "Analysis unavailable.";

/// Commits listed in a branch prompt before the rest are elided.
const PROMPT_COMMIT_LIMIT: usize = 20;

/// What a summary is about.
///
/// `Commits` holds a sorted, de-duplicated set so the same group of commits
/// maps to one entry whatever order it was requested in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AnalysisKey {
    Branch { name: String },
    Commits { ids: Vec<String> },
    File { commit: String, file: String },
}

impl AnalysisKey {
    pub fn branch(name: impl Into<String>) -> Self {
        AnalysisKey::Branch { name: name.into() }
    }

    pub fn commits<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        AnalysisKey::Commits {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn file(commit: impl Into<String>, file: impl Into<String>) -> Self {
        AnalysisKey::File {
            commit: commit.into(),
            file: file.into(),
        }
    }
}

/// A summary the host should produce.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub id: u64,
    pub key: AnalysisKey,
    pub generation: u64,
    pub prompt: String,
}

/// Completed summaries for the current dataset.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<AnalysisKey, String>,
}

impl AnalysisCache {
    pub fn get(&self, key: &AnalysisKey) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Store a summary. An existing entry is kept.
    pub fn insert(&mut self, key: AnalysisKey, summary: String) {
        self.entries.entry(key).or_insert(summary);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Result of asking for a summary.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisLookup {
    Cached(String),
    /// Queued under this request id.
    Requested(u64),
    /// An identical request is already in flight.
    Pending(u64),
}

/// An accepted response.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedAnalysis {
    pub key: AnalysisKey,
    /// Text to show: the summary or the placeholder.
    pub summary: String,
    /// Why the request failed, if it did.
    pub failure: Option<String>,
}

/// Cache plus the requests in flight.
#[derive(Debug, Default)]
pub struct AnalysisService {
    cache: AnalysisCache,
    pending: HashMap<u64, AnalysisKey>,
    outbox: Vec<AnalysisRequest>,
    next_id: u64,
    generation: u64,
}

impl AnalysisService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Return the cached summary for `key` or queue a request for it.
    pub fn request(&mut self, key: AnalysisKey, prompt: impl FnOnce() -> String) -> AnalysisLookup {
        if let Some(summary) = self.cache.get(&key) {
            return AnalysisLookup::Cached(summary.to_string());
        }
        if let Some((&id, _)) = self.pending.iter().find(|(_, k)| **k == key) {
            return AnalysisLookup::Pending(id);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert(id, key.clone());
        self.outbox.push(AnalysisRequest {
            id,
            key,
            generation: self.generation,
            prompt: prompt(),
        });
        AnalysisLookup::Requested(id)
    }

    /// Requests not yet handed to the host.
    pub fn take_requests(&mut self) -> Vec<AnalysisRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Accept a response. Returns `None` when the response is stale or unknown.
    ///
    /// Failures show [`ANALYSIS_PLACEHOLDER`] and are not cached.
    pub fn complete(
        &mut self,
        id: u64,
        generation: u64,
        result: std::result::Result<String, String>,
    ) -> Option<CompletedAnalysis> {
        if generation != self.generation {
            log::debug!("dropping analysis {id} from generation {generation}");
            return None;
        }
        let Some(key) = self.pending.remove(&id) else {
            log::debug!("dropping unknown analysis {id}");
            return None;
        };
        let completed = match result {
            Ok(summary) if !summary.trim().is_empty() => {
                self.cache.insert(key.clone(), summary.clone());
                CompletedAnalysis {
                    key,
                    summary,
                    failure: None,
                }
            }
            Ok(_) => CompletedAnalysis {
                key,
                summary: ANALYSIS_PLACEHOLDER.to_string(),
                failure: None,
            },
            Err(reason) => {
                log::warn!("analysis {id} failed: {reason}");
                CompletedAnalysis {
                    key,
                    summary: ANALYSIS_PLACEHOLDER.to_string(),
                    failure: Some(reason),
                }
            }
        };
        Some(completed)
    }

    /// Forget everything tied to the current dataset.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.cache.clear();
        self.pending.clear();
        self.outbox.clear();
    }
}

/// Prompt asking for a summary of a whole branch.
pub fn branch_prompt(cluster: &BranchCluster) -> String {
    let mut prompt = format!(
        "Summarize the purpose of the git branch \"{}\" based on its {} commits.\n\nCommits:\n",
        cluster.branch,
        cluster.commits.len()
    );
    for commit in cluster.commits.iter().take(PROMPT_COMMIT_LIMIT) {
        prompt.push_str(&format!(
            "- {} ({}): {}\n",
            commit.id, commit.data.author, commit.data.message
        ));
    }
    if cluster.commits.len() > PROMPT_COMMIT_LIMIT {
        let rest = cluster.commits.len() - PROMPT_COMMIT_LIMIT;
        prompt.push_str(&format!("- ... and {rest} more\n"));
    }
    prompt.push_str("\nDescribe the main changes and their intent in a short paragraph.");
    prompt
}

/// Prompt asking how a group of related commits fit together.
pub fn commits_prompt(commits: &[&NodeRecord]) -> String {
    let mut prompt = String::from("Explain how these related git commits fit together:\n\n");
    for commit in commits {
        prompt.push_str(&format!(
            "- {} by {} on {}: {}\n  files: {}\n",
            commit.id,
            commit.data.author,
            commit.data.date,
            commit.data.message,
            commit.data.files_changed.join(", ")
        ));
    }
    prompt.push_str("\nKeep the answer to a short paragraph.");
    prompt
}

/// Prompt asking for a deeper look at one file in one commit.
pub fn file_prompt(commit: &NodeRecord, file: &str) -> String {
    format!(
        "Analyze the change to `{file}` in commit {} by {}.\nCommit message: {}\n\n\
         Describe what changed in this file and why it matters.",
        commit.id, commit.data.author, commit.data.message
    )
}
