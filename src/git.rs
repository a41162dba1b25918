// src/git.rs

use crate::bridge::{self, GitBridge};
use crate::model::{Commit, CommitId, HistoryPage, Ref, RefKind, RefsByCommit, Signature};
use git2::{ReferenceType, Repository, Sort};
use std::collections::HashMap;
use std::path::Path;

/// Serves history from an on-disk repository through libgit2.
///
/// The repository is opened per request, so no state is kept between pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct Git2Bridge;

#[async_trait::async_trait]
impl GitBridge for Git2Bridge {
    async fn get_commit_history(
        &self,
        path: &Path,
        limit: usize,
        skip: usize,
    ) -> Result<HistoryPage, bridge::Error> {
        let path = path.to_path_buf();
        let page = tokio::task::spawn_blocking(move || history(&path, limit, skip)).await??;

        Ok(page)
    }
}

/// Walk every branch, remote branch, tag and HEAD, newest first, and return
/// the commits in `skip..skip + limit`.
pub fn history(repo_path: &Path, limit: usize, skip: usize) -> Result<HistoryPage, git2::Error> {
    let repo = Repository::open(repo_path)?;
    let tips = refs(&repo)?;

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    let mut starts: Vec<_> = tips.keys().copied().collect();
    starts.sort();
    for oid in starts {
        revwalk.push(oid)?;
    }
    // Covers a detached HEAD; an unborn one has nothing to walk.
    if let Ok(head) = repo.head() {
        if let Some(oid) = head.target() {
            revwalk.push(oid)?;
        }
    }

    let mut commits = Vec::new();
    let mut refs_by_commit = RefsByCommit::new();

    for oid in revwalk.skip(skip).take(limit) {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;

        if let Some(refs) = tips.get(&oid) {
            refs_by_commit.insert(oid.into(), refs.clone());
        }
        commits.push(convert(&commit));
    }
    log::debug!(
        "Read {} commit(s) from {} (skip={skip}, limit={limit})",
        commits.len(),
        repo_path.display()
    );

    Ok(HistoryPage {
        commits,
        refs_by_commit,
    })
}

/// Branches and tags by the commit they point at.
fn refs(repo: &Repository) -> Result<HashMap<git2::Oid, Vec<Ref>>, git2::Error> {
    let head = repo
        .head()
        .ok()
        .filter(|h| h.is_branch())
        .and_then(|h| h.name().map(String::from));
    let mut tips: HashMap<git2::Oid, Vec<Ref>> = HashMap::new();

    for reference in repo.references()? {
        let reference = reference?;
        if reference.kind() != Some(ReferenceType::Direct) {
            continue;
        }
        let kind = if reference.is_branch() {
            RefKind::LocalBranch
        } else if reference.is_remote() {
            RefKind::RemoteBranch
        } else if reference.is_tag() {
            RefKind::Tag
        } else {
            continue;
        };
        let (Some(name), Some(shorthand)) = (reference.name(), reference.shorthand()) else {
            continue;
        };
        // Tags of trees or blobs have no place in the graph.
        let Ok(commit) = reference.peel_to_commit() else {
            continue;
        };

        tips.entry(commit.id()).or_default().push(Ref {
            name: name.to_owned(),
            shorthand: shorthand.to_owned(),
            kind,
            is_head: head.as_deref() == Some(name),
        });
    }
    for refs in tips.values_mut() {
        refs.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Ok(tips)
}

fn signature(sig: &git2::Signature) -> Signature {
    Signature {
        name: sig.name().unwrap_or("Unknown").to_string(),
        email: sig.email().unwrap_or_default().to_string(),
        time: sig.when().seconds(),
    }
}

fn convert(commit: &git2::Commit) -> Commit {
    Commit {
        id: commit.id().into(),
        summary: commit.summary().unwrap_or_default().to_string(),
        body: commit.body().unwrap_or_default().to_string(),
        author: signature(&commit.author()),
        committer: signature(&commit.committer()),
        parents: commit.parent_ids().map(CommitId::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Oid, Time};
    use pretty_assertions::assert_eq;

    fn commit(repo: &Repository, refname: &str, msg: &str, time: i64, parents: &[Oid]) -> Oid {
        let sig = git2::Signature::new("Alice", "alice@example.com", &Time::new(time, 0)).unwrap();
        let tree = repo.find_tree(repo.treebuilder(None).unwrap().write().unwrap()).unwrap();
        let parents: Vec<_> = parents.iter().map(|p| repo.find_commit(*p).unwrap()).collect();
        let parents: Vec<_> = parents.iter().collect();

        repo.commit(Some(refname), &sig, &sig, msg, &tree, &parents).unwrap()
    }

    /// `main`: c1..c5 at times 1..5, `feature` off c2 at time 10, tag `v1` on c1.
    fn fixture(path: &Path) -> (Repository, Vec<Oid>) {
        let repo = Repository::init(path).unwrap();
        let mut oids = Vec::new();
        for i in 1..=5 {
            let parents: Vec<Oid> = oids.last().copied().into_iter().collect();
            oids.push(commit(&repo, "refs/heads/main", &format!("C{i}\n\nBody {i}"), i, &parents));
        }
        oids.push(commit(&repo, "refs/heads/feature", "F1", 10, &[oids[1]]));
        repo.set_head("refs/heads/main").unwrap();
        repo.tag_lightweight("v1", &repo.find_object(oids[0], None).unwrap(), false)
            .unwrap();

        (repo, oids)
    }

    fn ids(page: &HistoryPage) -> Vec<String> {
        page.commits.iter().map(|c| c.id.to_string()).collect()
    }

    #[test]
    fn test_history_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let (_repo, oids) = fixture(tmp.path());

        let first = history(tmp.path(), 3, 0).unwrap();
        assert_eq!(
            ids(&first),
            vec![oids[5].to_string(), oids[4].to_string(), oids[3].to_string()]
        );
        let second = history(tmp.path(), 10, 3).unwrap();
        assert_eq!(
            ids(&second),
            vec![oids[2].to_string(), oids[1].to_string(), oids[0].to_string()]
        );
    }

    #[test]
    fn test_commit_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let (_repo, oids) = fixture(tmp.path());
        let page = history(tmp.path(), 10, 0).unwrap();
        let c2 = page
            .commits
            .iter()
            .find(|c| c.id == CommitId::from(oids[1]))
            .unwrap();

        assert_eq!(c2.summary, "C2");
        assert_eq!(c2.body, "Body 2");
        assert_eq!(c2.committer.time, 2);
        assert_eq!(c2.author.name, "Alice");
        assert_eq!(c2.parents, vec![CommitId::from(oids[0])]);
    }

    #[test]
    fn test_refs_attached() {
        let tmp = tempfile::tempdir().unwrap();
        let (_repo, oids) = fixture(tmp.path());
        let page = history(tmp.path(), 10, 0).unwrap();
        let refs = &page.refs_by_commit;

        let main = &refs[&CommitId::from(oids[4])];
        assert_eq!(main.len(), 1);
        assert_eq!(main[0].shorthand, "main");
        assert!(main[0].is_head);

        let feature = &refs[&CommitId::from(oids[5])];
        assert_eq!(feature[0].kind, RefKind::LocalBranch);
        assert!(!feature[0].is_head);

        let tag = &refs[&CommitId::from(oids[0])];
        assert_eq!(tag[0].kind, RefKind::Tag);
        assert_eq!(tag[0].shorthand, "v1");

        assert!(!refs.contains_key(&CommitId::from(oids[2])));
    }

    #[test]
    fn test_refs_only_for_page() {
        let tmp = tempfile::tempdir().unwrap();
        let (_repo, _) = fixture(tmp.path());
        let page = history(tmp.path(), 2, 0).unwrap();

        assert!(page
            .refs_by_commit
            .keys()
            .all(|id| page.commits.iter().any(|c| &c.id == id)));
    }

    #[test]
    fn test_empty_repository() {
        let tmp = tempfile::tempdir().unwrap();
        Repository::init(tmp.path()).unwrap();

        assert!(history(tmp.path(), 10, 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bridge() {
        let tmp = tempfile::tempdir().unwrap();
        let (_repo, _) = fixture(tmp.path());
        let page = Git2Bridge
            .get_commit_history(tmp.path(), 4, 2)
            .await
            .unwrap();

        assert_eq!(page.len(), 4);
    }

    #[tokio::test]
    async fn test_bridge_missing_repository() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Git2Bridge
            .get_commit_history(&tmp.path().join("nope"), 10, 0)
            .await;

        assert!(matches!(result, Err(bridge::Error::Git(_))));
    }
}
