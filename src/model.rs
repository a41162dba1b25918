// src/model.rs

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Length of the abbreviated commit id shown in the UI.
pub const SHORT_ID_LEN: usize = 7;

/// A commit record that cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid commit: {reason}")]
    InvalidCommit { reason: String },
}

/// Opaque, content-addressed commit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The abbreviated form, at most [`SHORT_ID_LEN`] characters.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_ID_LEN) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CommitId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommitId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// Who made a commit, and when (seconds since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub time: i64,
}

impl Signature {
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time, 0).single()
    }
}

/// An immutable commit as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub summary: String,
    #[serde(default)]
    pub body: String,
    pub author: Signature,
    pub committer: Signature,
    /// Ordered parents: none for a root, two or more for a merge.
    #[serde(default)]
    pub parents: Vec<CommitId>,
}

impl Commit {
    /// Timestamp used for ordering history.
    pub fn timestamp(&self) -> i64 {
        self.committer.time
    }

    pub fn short_id(&self) -> &str {
        self.id.short()
    }

    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// Checks the record is well-formed enough to be keyed and linked.
    pub fn validate(&self) -> Result<(), Error> {
        if self.id.as_str().trim().is_empty() {
            return Err(Error::InvalidCommit {
                reason: "missing oid".to_owned(),
            });
        }
        if let Some(parent) = self.parents.iter().find(|p| p.as_str().trim().is_empty()) {
            return Err(Error::InvalidCommit {
                reason: format!("{} has an empty parent id {:?}", self.id, parent.as_str()),
            });
        }
        if self.parents.contains(&self.id) {
            return Err(Error::InvalidCommit {
                reason: format!("{} lists itself as a parent", self.id),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    LocalBranch,
    RemoteBranch,
    Tag,
}

impl RefKind {
    pub fn is_branch(&self) -> bool {
        matches!(self, Self::LocalBranch | Self::RemoteBranch)
    }
}

/// A branch or tag pointing at a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Fully qualified name, eg. `refs/heads/main`.
    pub name: String,
    /// Short name, eg. `main` or `origin/main`.
    pub shorthand: String,
    pub kind: RefKind,
    #[serde(default)]
    pub is_head: bool,
}

impl Ref {
    pub fn local(shorthand: &str) -> Self {
        Self {
            name: format!("refs/heads/{shorthand}"),
            shorthand: shorthand.to_owned(),
            kind: RefKind::LocalBranch,
            is_head: false,
        }
    }

    pub fn remote(shorthand: &str) -> Self {
        Self {
            name: format!("refs/remotes/{shorthand}"),
            shorthand: shorthand.to_owned(),
            kind: RefKind::RemoteBranch,
            is_head: false,
        }
    }

    pub fn tag(shorthand: &str) -> Self {
        Self {
            name: format!("refs/tags/{shorthand}"),
            shorthand: shorthand.to_owned(),
            kind: RefKind::Tag,
            is_head: false,
        }
    }

    pub fn head(mut self) -> Self {
        self.is_head = true;
        self
    }
}

/// Refs attached to each commit. Most commits have none.
pub type RefsByCommit = HashMap<CommitId, Vec<Ref>>;

/// One page of history returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub refs_by_commit: RefsByCommit,
}

impl HistoryPage {
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}
