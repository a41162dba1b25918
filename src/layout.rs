// src/layout.rs

use crate::lanes::{self, Lanes};
use crate::model::CommitId;
use crate::sort::{self, SortMode};
use crate::store::CommitStore;
use crate::visibility::BranchVisibility;
use std::collections::HashMap;

/// Rows and lanes of the visible commits, rebuilt from the whole store
/// whenever it or the branch filter changes.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    rows: Vec<CommitId>,
    index: HashMap<CommitId, usize>,
    lanes: Lanes,
}

impl Layout {
    pub fn compute(store: &CommitStore, visibility: &BranchVisibility, mode: SortMode) -> Self {
        let visible = store
            .commits()
            .values()
            .filter(|c| !visibility.hides(store.refs_for(c.id.as_str())));
        let rows = sort::sort(visible, mode);
        let index = sort::index(&rows);
        let lanes = lanes::assign(&rows, store.commits());

        log::debug!(
            "Laid out {} of {} commit(s) in {} lane(s)",
            rows.len(),
            store.len(),
            lanes.width()
        );
        Self { rows, index, lanes }
    }

    pub fn rows(&self) -> &[CommitId] {
        &self.rows
    }

    pub fn index(&self) -> &HashMap<CommitId, usize> {
        &self.index
    }

    pub fn lanes(&self) -> &Lanes {
        &self.lanes
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::commit;
    use crate::model::{Ref, RefsByCommit};
    use crate::visibility::MemoryStore;
    use std::path::Path;

    #[test]
    fn test_hidden_branch_commits_are_left_out() {
        let mut store = CommitStore::new();
        store.upsert_batch(vec![
            commit("c0", &[], 0),
            commit("c1", &["c0"], 1),
            commit("f1", &["c0"], 2),
        ]);
        store.attach_refs(RefsByCommit::from([
            (CommitId::from("c1"), vec![Ref::local("main")]),
            (CommitId::from("f1"), vec![Ref::local("feature/x")]),
        ]));
        let mut visibility = BranchVisibility::new(Box::new(MemoryStore::new()));
        visibility.attach(Path::new("/repo"));

        let layout = Layout::compute(&store, &visibility, SortMode::Date);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.lanes().width(), 2);

        visibility.toggle("feature/x");
        let layout = Layout::compute(&store, &visibility, SortMode::Date);
        assert_eq!(layout.rows(), &[CommitId::from("c1"), CommitId::from("c0")]);
        assert_eq!(layout.row_of("f1"), None);
        assert_eq!(layout.lanes().width(), 1);
    }
}
