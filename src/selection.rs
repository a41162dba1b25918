// src/selection.rs

use crate::model::CommitId;
use std::collections::{BTreeSet, HashMap};

/// Keys consumed by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Escape,
}

impl Key {
    /// Parse a DOM-style key name such as `"ArrowDown"`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(Self::ArrowUp),
            "ArrowDown" => Some(Self::ArrowDown),
            "Home" => Some(Self::Home),
            "End" => Some(Self::End),
            "Escape" => Some(Self::Escape),
            _ => None,
        }
    }
}

/// What happened to the primary selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Selected(CommitId),
    Cleared,
}

/// The id is not among the visible rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound;

/// Primary selection plus a multi-selection that contains it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    primary: Option<CommitId>,
    multi: BTreeSet<CommitId>,
}

impl Selection {
    pub fn primary(&self) -> Option<&CommitId> {
        self.primary.as_ref()
    }

    pub fn multi(&self) -> &BTreeSet<CommitId> {
        &self.multi
    }

    /// Make `id` the only selected commit.
    pub fn select(
        &mut self,
        id: &str,
        index: &HashMap<CommitId, usize>,
    ) -> Result<Transition, NotFound> {
        let Some((id, _)) = index.get_key_value(id) else {
            return Err(NotFound);
        };
        Ok(self.set(id.clone()))
    }

    /// Add `id` to the multi-selection as the new primary, or remove it.
    pub fn toggle(
        &mut self,
        id: &str,
        index: &HashMap<CommitId, usize>,
    ) -> Result<Transition, NotFound> {
        let Some((id, _)) = index.get_key_value(id) else {
            return Err(NotFound);
        };
        if self.multi.remove(id) {
            if self.primary.as_ref() == Some(id) {
                self.primary = None;
                return Ok(Transition::Cleared);
            }
            return Ok(Transition::Unchanged);
        }
        self.multi.insert(id.clone());
        self.primary = Some(id.clone());

        Ok(Transition::Selected(id.clone()))
    }

    pub fn clear(&mut self) -> Transition {
        self.multi.clear();
        match self.primary.take() {
            Some(_) => Transition::Cleared,
            None => Transition::Unchanged,
        }
    }

    /// Apply a navigation key over the visible `rows`.
    pub fn handle_key(
        &mut self,
        key: Key,
        rows: &[CommitId],
        index: &HashMap<CommitId, usize>,
    ) -> Transition {
        let current = self.primary.as_ref().and_then(|id| index.get(id)).copied();
        let last = rows.len().saturating_sub(1);
        let target = match (key, current) {
            (Key::Escape, _) => return self.clear(),
            _ if rows.is_empty() => return Transition::Unchanged,
            (Key::ArrowDown, Some(row)) => (row + 1).min(last),
            (Key::ArrowUp, Some(row)) => row.saturating_sub(1),
            (Key::ArrowDown | Key::ArrowUp, None) => 0,
            (Key::Home, _) => 0,
            (Key::End, _) => last,
        };
        self.set(rows[target].clone())
    }

    /// Drop anything no longer in `index`, eg. after hiding a branch.
    pub fn retain(&mut self, index: &HashMap<CommitId, usize>) -> Transition {
        self.multi.retain(|id| index.contains_key(id));

        match &self.primary {
            Some(id) if !index.contains_key(id) => {
                self.primary = None;
                Transition::Cleared
            }
            _ => Transition::Unchanged,
        }
    }

    fn set(&mut self, id: CommitId) -> Transition {
        self.multi.clear();
        self.multi.insert(id.clone());

        if self.primary.as_ref() == Some(&id) {
            return Transition::Unchanged;
        }
        self.primary = Some(id.clone());
        Transition::Selected(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort;

    fn rows(ids: &[&str]) -> (Vec<CommitId>, HashMap<CommitId, usize>) {
        let rows: Vec<CommitId> = ids.iter().copied().map(CommitId::from).collect();
        let index = sort::index(&rows);
        (rows, index)
    }

    fn selected(id: &str) -> Transition {
        Transition::Selected(CommitId::from(id))
    }

    #[test]
    fn test_arrows_from_nothing() {
        let (rows, index) = rows(&["a", "b", "c"]);

        let mut s = Selection::default();
        assert_eq!(s.handle_key(Key::ArrowDown, &rows, &index), selected("a"));

        let mut s = Selection::default();
        assert_eq!(s.handle_key(Key::ArrowUp, &rows, &index), selected("a"));
    }

    #[test]
    fn test_navigation() {
        let (rows, index) = rows(&["a", "b", "c"]);
        let mut s = Selection::default();

        s.handle_key(Key::ArrowDown, &rows, &index);
        assert_eq!(s.handle_key(Key::ArrowDown, &rows, &index), selected("b"));
        assert_eq!(s.handle_key(Key::End, &rows, &index), selected("c"));
        assert_eq!(s.handle_key(Key::Home, &rows, &index), selected("a"));
        assert_eq!(s.handle_key(Key::ArrowUp, &rows, &index), Transition::Unchanged);
        assert_eq!(s.primary(), Some(&CommitId::from("a")));
    }

    #[test]
    fn test_clamped_at_the_end() {
        let (rows, index) = rows(&["a", "b"]);
        let mut s = Selection::default();

        s.handle_key(Key::End, &rows, &index);
        assert_eq!(s.handle_key(Key::ArrowDown, &rows, &index), Transition::Unchanged);
        assert_eq!(s.handle_key(Key::End, &rows, &index), Transition::Unchanged);
        assert_eq!(s.primary(), Some(&CommitId::from("b")));
    }

    #[test]
    fn test_empty_rows() {
        let (rows, index) = rows(&[]);
        let mut s = Selection::default();

        for key in [Key::ArrowDown, Key::ArrowUp, Key::Home, Key::End, Key::Escape] {
            assert_eq!(s.handle_key(key, &rows, &index), Transition::Unchanged);
        }
    }

    #[test]
    fn test_escape() {
        let (rows, index) = rows(&["a", "b"]);
        let mut s = Selection::default();

        s.select("b", &index).unwrap();
        assert_eq!(s.handle_key(Key::Escape, &rows, &index), Transition::Cleared);
        assert!(s.multi().is_empty());
        assert_eq!(s.handle_key(Key::Escape, &rows, &index), Transition::Unchanged);
    }

    #[test]
    fn test_select_unknown() {
        let (_, index) = rows(&["a"]);
        let mut s = Selection::default();

        s.select("a", &index).unwrap();
        assert_eq!(s.select("zzz", &index), Err(NotFound));
        assert_eq!(s.primary(), Some(&CommitId::from("a")));
        assert_eq!(s.select("a", &index), Ok(Transition::Unchanged));
    }

    #[test]
    fn test_multi_contains_primary() {
        let (_, index) = rows(&["a", "b", "c"]);
        let mut s = Selection::default();

        s.select("a", &index).unwrap();
        assert_eq!(s.toggle("c", &index), Ok(selected("c")));
        assert_eq!(s.multi().len(), 2);
        assert!(s.multi().contains(s.primary().unwrap()));

        assert_eq!(s.toggle("a", &index), Ok(Transition::Unchanged));
        assert_eq!(s.toggle("c", &index), Ok(Transition::Cleared));
        assert!(s.multi().is_empty());
        assert_eq!(s.primary(), None);
    }

    #[test]
    fn test_retain() {
        let (_, index) = rows(&["a", "b"]);
        let mut s = Selection::default();
        s.select("a", &index).unwrap();
        s.toggle("b", &index).unwrap();

        let (_, smaller) = rows(&["a"]);
        assert_eq!(s.retain(&smaller), Transition::Cleared);
        assert_eq!(s.multi().len(), 1);

        assert_eq!(Key::from_name("Home"), Some(Key::Home));
        assert_eq!(Key::from_name("Tab"), None);
    }
}
