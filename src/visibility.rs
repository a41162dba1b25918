// src/visibility.rs

use crate::model::{Ref, RefKind, RefsByCommit};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::{fs, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed data: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// String storage for small bits of per-repository UI state.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&mut self, key: &str, value: String) -> Result<(), Error>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }
}

/// Stores every key in a single JSON object on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<BTreeMap<String, String>, Error> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        // An unreadable file is replaced rather than blocking every write.
        let mut values = self.read().unwrap_or_default();
        values.insert(key.to_owned(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;

        Ok(())
    }
}

/// Key under which the hidden set of the repository at `path` is kept.
pub fn storage_key(path: &Path) -> String {
    format!("branch-visibility:{}", path.display())
}

/// Decode a persisted hidden set: a JSON array of branch names.
pub fn parse_hidden(value: &str) -> Result<BTreeSet<String>, Error> {
    Ok(serde_json::from_str(value)?)
}

/// Branch names found in ref attachments, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailableBranches {
    pub local: BTreeSet<String>,
    pub remote: BTreeSet<String>,
}

impl AvailableBranches {
    pub fn from_refs(refs_by_commit: &RefsByCommit) -> Self {
        let mut branches = Self::default();

        for r in refs_by_commit.values().flatten() {
            match r.kind {
                RefKind::LocalBranch => branches.local.insert(r.shorthand.clone()),
                RefKind::RemoteBranch => branches.remote.insert(r.shorthand.clone()),
                RefKind::Tag => false,
            };
        }
        branches
    }

    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.local.iter().chain(&self.remote)
    }
}

/// The set of branches whose commits are left out of the graph, persisted
/// per repository.
pub struct BranchVisibility {
    store: Box<dyn KeyValueStore>,
    key: Option<String>,
    hidden: BTreeSet<String>,
}

impl std::fmt::Debug for BranchVisibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BranchVisibility")
            .field("key", &self.key)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

impl BranchVisibility {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: None,
            hidden: BTreeSet::new(),
        }
    }

    /// Restore the hidden set of the repository at `path`. Missing or
    /// malformed data means nothing is hidden.
    pub fn attach(&mut self, path: &Path) {
        let key = storage_key(path);

        self.hidden = match self.store.get(&key) {
            Ok(Some(value)) => parse_hidden(&value).unwrap_or_else(|e| {
                log::debug!("Ignoring branch visibility for {}: {e}", path.display());
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                log::debug!("Ignoring branch visibility for {}: {e}", path.display());
                BTreeSet::new()
            }
        };
        self.key = Some(key);
    }

    pub fn hidden(&self) -> &BTreeSet<String> {
        &self.hidden
    }

    pub fn is_hidden(&self, branch: &str) -> bool {
        self.hidden.contains(branch)
    }

    /// A commit is hidden when it carries refs and every one of them is a
    /// hidden branch. Ancestry is not considered.
    pub fn hides(&self, refs: &[Ref]) -> bool {
        !refs.is_empty()
            && refs
                .iter()
                .all(|r| r.kind.is_branch() && self.hidden.contains(&r.shorthand))
    }

    /// Flip whether `branch` is hidden. Returns the new hidden state.
    pub fn toggle(&mut self, branch: &str) -> bool {
        let hidden = if self.hidden.remove(branch) {
            false
        } else {
            self.hidden.insert(branch.to_owned())
        };
        self.persist();

        hidden
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
        self.persist();
    }

    pub fn hide_all(&mut self, available: &AvailableBranches) {
        self.hidden = available.all().cloned().collect();
        self.persist();
    }

    fn persist(&mut self) {
        let Some(key) = &self.key else {
            return;
        };
        let result = serde_json::to_string(&self.hidden)
            .map_err(Error::from)
            .and_then(|value| self.store.set(key, value));

        if let Err(e) = result {
            log::warn!("Failed to save branch visibility: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommitId;
    use pretty_assertions::assert_eq;

    fn refs() -> RefsByCommit {
        RefsByCommit::from([
            (
                CommitId::from("c1"),
                vec![Ref::local("main").head(), Ref::remote("origin/main")],
            ),
            (CommitId::from("c2"), vec![Ref::local("feature/x")]),
            (
                CommitId::from("c3"),
                vec![Ref::local("feature/x"), Ref::tag("v1.0")],
            ),
        ])
    }

    fn visibility(store: impl KeyValueStore + 'static) -> BranchVisibility {
        let mut v = BranchVisibility::new(Box::new(store));
        v.attach(Path::new("/repo"));
        v
    }

    #[test]
    fn test_available_branches() {
        let available = AvailableBranches::from_refs(&refs());

        assert_eq!(
            available.local,
            BTreeSet::from(["feature/x".to_owned(), "main".to_owned()])
        );
        assert_eq!(available.remote, BTreeSet::from(["origin/main".to_owned()]));
    }

    #[test]
    fn test_hides() {
        let mut v = visibility(MemoryStore::new());
        let refs = refs();

        assert!(v.toggle("feature/x"));
        assert!(v.hides(&refs[&CommitId::from("c2")]));
        // Tagged, so still shown.
        assert!(!v.hides(&refs[&CommitId::from("c3")]));
        assert!(!v.hides(&refs[&CommitId::from("c1")]));
        assert!(!v.hides(&[]));

        v.toggle("main");
        assert!(!v.hides(&refs[&CommitId::from("c1")]));
        v.toggle("origin/main");
        assert!(v.hides(&refs[&CommitId::from("c1")]));
    }

    #[test]
    fn test_toggle_twice() {
        let mut v = visibility(MemoryStore::new());

        assert!(v.toggle("main"));
        assert!(!v.toggle("main"));
        assert!(v.hidden().is_empty());
    }

    #[test]
    fn test_show_and_hide_all() {
        let mut v = visibility(MemoryStore::new());
        let available = AvailableBranches::from_refs(&refs());

        v.hide_all(&available);
        assert_eq!(v.hidden().len(), 3);
        v.show_all();
        assert!(v.hidden().is_empty());
    }

    #[test]
    fn test_persisted_per_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("state.json");

        let mut v = visibility(JsonFileStore::new(&file));
        v.toggle("feature/x");

        let restored = visibility(JsonFileStore::new(&file));
        assert!(restored.is_hidden("feature/x"));

        let mut other = BranchVisibility::new(Box::new(JsonFileStore::new(&file)));
        other.attach(Path::new("/elsewhere"));
        assert!(other.hidden().is_empty());

        let stored = JsonFileStore::new(&file)
            .get(&storage_key(Path::new("/repo")))
            .unwrap()
            .unwrap();
        assert_eq!(stored, r#"["feature/x"]"#);
    }

    #[test]
    fn test_corrupt_data_means_nothing_hidden() {
        let mut store = MemoryStore::new();
        store
            .set(&storage_key(Path::new("/repo")), "{not json".to_owned())
            .unwrap();
        assert!(visibility(store).hidden().is_empty());

        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("state.json");
        fs::write(&file, "garbage").unwrap();
        let mut v = visibility(JsonFileStore::new(&file));
        assert!(v.hidden().is_empty());

        // Writing recovers the file.
        v.toggle("main");
        assert!(visibility(JsonFileStore::new(&file)).is_hidden("main"));
    }

    #[test]
    fn test_parse_hidden() {
        assert!(parse_hidden(r#"["a", "b"]"#).is_ok());
        assert!(parse_hidden(r#"{"a": 1}"#).is_err());
        assert!(parse_hidden("").is_err());
    }
}
