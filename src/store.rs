// src/store.rs

use crate::model::{self, Commit, CommitId, Ref, RefsByCommit};
use std::collections::HashMap;

/// Outcome of merging one batch into the store.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Upsert {
    /// Commits whose oid was not in the store before.
    pub inserted: usize,
    /// Commits that already existed and were overwritten.
    pub updated: usize,
    /// Entries rejected as malformed. The rest of the batch still applied.
    pub rejected: Vec<model::Error>,
}

/// Deduplicating map from commit id to commit, grown one page at a time.
#[derive(Debug, Default)]
pub struct CommitStore {
    commits: HashMap<CommitId, Commit>,
    refs: RefsByCommit,
}

impl CommitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite every valid commit of the batch.
    pub fn upsert_batch(&mut self, commits: impl IntoIterator<Item = Commit>) -> Upsert {
        let mut result = Upsert::default();

        for commit in commits {
            if let Err(e) = commit.validate() {
                log::warn!("Rejecting commit: {e}");
                result.rejected.push(e);
                continue;
            }
            match self.commits.insert(commit.id.clone(), commit) {
                Some(_) => result.updated += 1,
                None => result.inserted += 1,
            }
        }
        result
    }

    /// Replace the ref attachments of every stored commit named in `refs`.
    /// Refs pointing at commits the store does not hold are dropped.
    pub fn attach_refs(&mut self, refs: RefsByCommit) {
        for (id, refs) in refs {
            if !self.commits.contains_key(&id) {
                log::debug!("Dropping refs of unknown commit {id}");
                continue;
            }
            if refs.is_empty() {
                self.refs.remove(&id);
            } else {
                self.refs.insert(id, refs);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Commit> {
        self.commits.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commits.contains_key(id)
    }

    pub fn refs_for(&self, id: &str) -> &[Ref] {
        self.refs.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn refs(&self) -> &RefsByCommit {
        &self.refs
    }

    pub fn commits(&self) -> &HashMap<CommitId, Commit> {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    pub fn clear(&mut self) {
        self.commits.clear();
        self.refs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::commit;

    #[test]
    fn test_overlapping_batches() {
        let mut store = CommitStore::new();
        let b1 = vec![
            commit("c0", &[], 0),
            commit("c1", &["c0"], 1),
            commit("c2", &["c1"], 2),
        ];
        let b2 = vec![
            commit("c2", &["c1"], 2),
            commit("c3", &["c2"], 3),
        ];

        assert_eq!(store.upsert_batch(b1).inserted, 3);

        let result = store.upsert_batch(b2);
        assert_eq!(result.inserted, 1);
        assert_eq!(result.updated, 1);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_invalid_commit_does_not_abort_batch() {
        let mut store = CommitStore::new();
        let result = store.upsert_batch(vec![
            commit("c0", &[], 0),
            commit("", &["c0"], 1),
            commit("c2", &["c0"], 2),
        ]);

        assert_eq!(result.inserted, 2);
        assert_eq!(result.rejected.len(), 1);
        assert!(store.contains("c0"));
        assert!(store.contains("c2"));
    }

    #[test]
    fn test_attach_refs() {
        let mut store = CommitStore::new();
        store.upsert_batch(vec![commit("c0", &[], 0)]);
        store.attach_refs(RefsByCommit::from([(
            CommitId::from("c0"),
            vec![Ref::local("main").head()],
        )]));

        assert_eq!(store.refs_for("c0").len(), 1);
        assert!(store.refs_for("c1").is_empty());

        store.attach_refs(RefsByCommit::from([(CommitId::from("c0"), vec![])]));
        assert!(store.refs_for("c0").is_empty());
    }

    #[test]
    fn test_refs_of_rejected_commit_are_dropped() {
        let mut store = CommitStore::new();
        let result = store.upsert_batch(vec![commit("c0", &[], 0), commit("c1", &["c1"], 1)]);
        store.attach_refs(RefsByCommit::from([
            (CommitId::from("c0"), vec![Ref::local("main")]),
            (CommitId::from("c1"), vec![Ref::local("broken")]),
        ]));

        assert_eq!(result.rejected.len(), 1);
        assert_eq!(store.refs().len(), 1);
        assert!(store.refs_for("c1").is_empty());
    }
}
