// src/sort.rs

use crate::model::{Commit, CommitId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Above this many commits, sorting is done in parallel.
const PARALLEL_SORT_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Newest commit timestamp first, ties by ascending oid.
    ///
    /// Under clock skew a child may sort above its parent.
    #[default]
    Date,
    /// Children always before parents; otherwise as [`SortMode::Date`].
    #[value(name = "topo")]
    Topological,
}

/// The ordering key shared by both modes.
fn by_date(a: &Commit, b: &Commit) -> Ordering {
    b.timestamp()
        .cmp(&a.timestamp())
        .then_with(|| a.id.cmp(&b.id))
}

/// Order commits into rows, newest first.
pub fn sort<'a, I>(commits: I, mode: SortMode) -> Vec<CommitId>
where
    I: IntoIterator<Item = &'a Commit>,
{
    let commits: Vec<&Commit> = commits.into_iter().collect();

    match mode {
        SortMode::Date => by_timestamp(commits),
        SortMode::Topological => topological(commits),
    }
}

fn by_timestamp(mut commits: Vec<&Commit>) -> Vec<CommitId> {
    // Keys are unique oids, so an unstable sort is still deterministic.
    if commits.len() > PARALLEL_SORT_THRESHOLD {
        commits.par_sort_unstable_by(|a, b| by_date(a, b));
    } else {
        commits.sort_unstable_by(|a, b| by_date(a, b));
    }
    commits.into_iter().map(|c| c.id.clone()).collect()
}

/// Heap entry ordered so that the max element is the next row.
struct Ready<'a>(&'a Commit);

impl PartialEq for Ready<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Ready<'_> {}

impl PartialOrd for Ready<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ready<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        by_date(other.0, self.0)
    }
}

/// Kahn's algorithm over the loaded set: a commit becomes ready once all
/// of its loaded children have been emitted.
fn topological(commits: Vec<&Commit>) -> Vec<CommitId> {
    let by_id: HashMap<&CommitId, &Commit> = commits.iter().map(|c| (&c.id, *c)).collect();
    let mut pending_children: HashMap<&CommitId, usize> = HashMap::new();

    for commit in &commits {
        for parent in dedup(&commit.parents) {
            if by_id.contains_key(parent) {
                *pending_children.entry(parent).or_default() += 1;
            }
        }
    }

    let mut heap: BinaryHeap<Ready> = commits
        .iter()
        .filter(|c| !pending_children.contains_key(&c.id))
        .map(|c| Ready(*c))
        .collect();
    let mut rows = Vec::with_capacity(commits.len());

    while let Some(Ready(commit)) = heap.pop() {
        rows.push(commit.id.clone());

        for parent in dedup(&commit.parents) {
            let Some(count) = pending_children.get_mut(parent) else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                pending_children.remove(parent);
                if let Some(parent) = by_id.get(parent) {
                    heap.push(Ready(*parent));
                }
            }
        }
    }

    if rows.len() < commits.len() {
        // Only reachable with a cycle in malformed input; keep the remainder
        // in date order rather than dropping it.
        let mut placed: Vec<&CommitId> = rows.iter().collect();
        placed.sort_unstable();
        let rest: Vec<&Commit> = commits
            .into_iter()
            .filter(|c| placed.binary_search(&&c.id).is_err())
            .collect();
        log::warn!("History contains a cycle through {} commit(s)", rest.len());
        rows.extend(by_timestamp(rest));
    }
    rows
}

/// Parent ids without repeats, keeping the first occurrence.
fn dedup(parents: &[CommitId]) -> impl Iterator<Item = &CommitId> {
    parents
        .iter()
        .enumerate()
        .filter(|(i, p)| !parents[..*i].contains(*p))
        .map(|(_, p)| p)
}

/// Position of every id in `rows`.
pub fn index(rows: &[CommitId]) -> HashMap<CommitId, usize> {
    rows.iter()
        .enumerate()
        .map(|(row, id)| (id.clone(), row))
        .collect()
}
