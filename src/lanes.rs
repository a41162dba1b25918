// src/lanes.rs

use crate::model::{Commit, CommitId};
use crate::sort;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The line from a commit down (or, under clock skew, up) to one parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub parent: CommitId,
    /// Lane the edge travels in after leaving the child's row.
    pub lane: usize,
    pub from_row: usize,
    /// Row of the parent, or `None` if the parent is not loaded yet.
    pub to_row: Option<usize>,
}

impl Edge {
    /// Whether the edge keeps a lane occupied between its endpoints.
    /// Edges pointing upwards do not.
    pub fn occupies_lane(&self) -> bool {
        self.to_row.map_or(true, |to| to > self.from_row)
    }

    /// Whether the edge passes through `row` without ending there.
    pub fn passes(&self, row: usize) -> bool {
        self.occupies_lane() && row > self.from_row && self.to_row.map_or(true, |to| row < to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneInfo {
    pub row: usize,
    pub lane: usize,
    pub edges: Vec<Edge>,
}

/// Lane assignment for a row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lanes {
    by_commit: BTreeMap<CommitId, LaneInfo>,
    width: usize,
}

impl Lanes {
    pub fn get(&self, id: &str) -> Option<&LaneInfo> {
        self.by_commit.get(id)
    }

    /// Number of lanes needed to draw the graph.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.by_commit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_commit.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CommitId, &LaneInfo)> {
        self.by_commit.iter()
    }

    /// For each of the first `rows` rows, the lanes crossed by an edge
    /// that neither starts nor ends on that row.
    pub fn passing(&self, rows: usize) -> Vec<BTreeSet<usize>> {
        let mut passing = vec![BTreeSet::new(); rows];

        for edge in self.by_commit.values().flat_map(|info| &info.edges) {
            if !edge.occupies_lane() {
                continue;
            }
            let end = edge.to_row.unwrap_or(rows).min(rows);
            for lanes in passing.iter_mut().take(end).skip(edge.from_row + 1) {
                lanes.insert(edge.lane);
            }
        }
        passing
    }
}

/// Lowest free slot, growing the lane set if all are taken.
fn free_lane(active: &mut Vec<Option<&CommitId>>) -> usize {
    match active.iter().position(Option::is_none) {
        Some(lane) => lane,
        None => {
            active.push(None);
            active.len() - 1
        }
    }
}

/// Assign lanes to `rows`, walking from the newest row down.
///
/// `commits` is the whole loaded set: a parent that is loaded but absent
/// from `rows` is filtered out of the view and gets no edge, while a parent
/// that is not loaded at all keeps its lane open past the last row.
///
/// A row's lanes depend only on the rows above it, so extending `rows` at
/// the tail leaves earlier assignments untouched.
pub fn assign(rows: &[CommitId], commits: &HashMap<CommitId, Commit>) -> Lanes {
    let index = sort::index(rows);
    // The commit each lane is waiting to reach.
    let mut active: Vec<Option<&CommitId>> = Vec::new();
    // Edges whose parent has not been reached, by parent.
    let mut open: HashMap<&CommitId, Vec<(&CommitId, usize)>> = HashMap::new();
    let mut lanes = Lanes::default();

    for (row, id) in rows.iter().enumerate() {
        let lane = active
            .iter()
            .position(|awaited| *awaited == Some(id))
            .unwrap_or_else(|| free_lane(&mut active));

        for awaited in active.iter_mut() {
            if *awaited == Some(id) {
                *awaited = None;
            }
        }
        for (child, edge) in open.remove(id).unwrap_or_default() {
            if let Some(info) = lanes.by_commit.get_mut(child) {
                info.edges[edge].to_row = Some(row);
            }
        }

        let parents = commits.get(id).map(|c| c.parents.as_slice()).unwrap_or_default();
        let mut edges = Vec::with_capacity(parents.len());
        let mut own_lane_used = false;

        for (i, parent) in parents.iter().enumerate() {
            if parents[..i].contains(parent) {
                continue;
            }
            match index.get(parent) {
                Some(&to) if to < row => {
                    edges.push(Edge {
                        parent: parent.clone(),
                        lane,
                        from_row: row,
                        to_row: Some(to),
                    });
                    continue;
                }
                None if commits.contains_key(parent) => continue,
                _ => {}
            }
            let edge_lane = if own_lane_used {
                free_lane(&mut active)
            } else {
                own_lane_used = true;
                lane
            };
            active[edge_lane] = Some(parent);
            open.entry(parent).or_default().push((id, edges.len()));
            edges.push(Edge {
                parent: parent.clone(),
                lane: edge_lane,
                from_row: row,
                to_row: None,
            });
        }

        let occupied = active.iter().rposition(Option::is_some).map_or(0, |l| l + 1);
        lanes.width = lanes.width.max(occupied).max(lane + 1);
        lanes.by_commit.insert(id.clone(), LaneInfo { row, lane, edges });
    }
    lanes
}
