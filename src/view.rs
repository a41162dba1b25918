// src/view.rs

use crate::bridge::{self, GitBridge};
use crate::config::GraphConfig;
use crate::lanes::Lanes;
use crate::layout::Layout;
use crate::model::{Commit, CommitId, HistoryPage, Ref};
use crate::pagination::{HistoryRequest, LoadSignal, Pagination, RequestKind};
use crate::selection::{Key, Selection, Transition};
use crate::store::CommitStore;
use crate::visibility::{AvailableBranches, BranchVisibility, KeyValueStore};
use crate::Error;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Notifications for the panels around the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// The primary selection changed. `None` when it was cleared.
    CommitSelected(Option<Commit>),
    HistoryLoaded { total_loaded: usize, has_more: bool },
    /// A fetch failed; meant to be shown as a dismissable notification.
    LoadFailed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

type Subscriber = Box<dyn FnMut(&GraphEvent)>;

/// The commit graph of one open repository: history, layout, selection and
/// branch filter, owned by a single UI thread.
pub struct GraphView {
    config: GraphConfig,
    store: CommitStore,
    pagination: Pagination,
    selection: Selection,
    visibility: BranchVisibility,
    layout: Layout,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: usize,
}

impl fmt::Debug for GraphView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphView")
            .field("config", &self.config)
            .field("pagination", &self.pagination)
            .field("selection", &self.selection)
            .field("visibility", &self.visibility)
            .field("rows", &self.layout.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl GraphView {
    pub fn new(config: GraphConfig, persistence: Box<dyn KeyValueStore>) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            pagination: Pagination::new(&config),
            config,
            store: CommitStore::new(),
            selection: Selection::default(),
            visibility: BranchVisibility::new(persistence),
            layout: Layout::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
        })
    }

    pub fn subscribe(&mut self, f: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(f)));

        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != id);
        self.subscribers.len() != before
    }

    fn emit(&mut self, event: GraphEvent) {
        for (_, subscriber) in self.subscribers.iter_mut() {
            subscriber(&event);
        }
    }

    fn emit_transition(&mut self, transition: Transition) -> bool {
        let commit = match transition {
            Transition::Unchanged => return false,
            Transition::Selected(id) => self.store.get(id.as_str()).cloned(),
            Transition::Cleared => None,
        };
        self.emit(GraphEvent::CommitSelected(commit));
        true
    }

    fn relayout(&mut self) {
        self.layout = Layout::compute(&self.store, &self.visibility, self.config.sort);
        let transition = self.selection.retain(self.layout.index());
        self.emit_transition(transition);
    }

    // History loading.

    /// Start loading `path` from scratch. Switching to another repository
    /// drops everything shown for the previous one right away; reloading
    /// the same one keeps it on screen until the first page arrives.
    pub fn begin_load(&mut self, path: &Path) -> HistoryRequest {
        if self.pagination.path() != Some(path) {
            self.store.clear();
            self.visibility.attach(path);
            let transition = self.selection.clear();
            self.emit_transition(transition);
            self.relayout();
        }
        self.pagination.begin_initial(path)
    }

    /// The next page to fetch, if `signal` is near the loaded tail and no
    /// fetch is already in flight.
    pub fn check_load_more(&mut self, signal: LoadSignal) -> Option<HistoryRequest> {
        self.pagination.begin_more(signal)
    }

    /// Merge the backend's answer to `request`. Responses to superseded
    /// requests are dropped. On failure everything loaded so far is kept.
    pub fn apply(
        &mut self,
        request: &HistoryRequest,
        result: Result<HistoryPage, bridge::Error>,
    ) -> Result<(), Error> {
        if !self.pagination.is_current(request) {
            log::debug!(
                "Dropping stale response for {} (skip={})",
                request.path.display(),
                request.skip
            );
            return Ok(());
        }
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.pagination.fail(request);
                log::warn!("Failed to load history of {}: {e}", request.path.display());
                self.emit(GraphEvent::LoadFailed {
                    message: e.to_string(),
                });
                return Err(Error::FetchFailure(e));
            }
        };
        if request.kind == RequestKind::Initial {
            self.store.clear();
        }
        let returned = page.len();
        let upsert = self.store.upsert_batch(page.commits);
        self.store.attach_refs(page.refs_by_commit);
        self.pagination.complete(request, returned, upsert.inserted);

        log::debug!(
            "Merged {returned} commit(s) at offset {}: {} new, {} rejected",
            request.skip,
            upsert.inserted,
            upsert.rejected.len()
        );
        self.relayout();
        self.emit(GraphEvent::HistoryLoaded {
            total_loaded: self.pagination.total_loaded(),
            has_more: self.pagination.has_more(),
        });
        Ok(())
    }

    async fn fetch<B>(&mut self, bridge: &B, request: HistoryRequest) -> Result<(), Error>
    where
        B: GitBridge + ?Sized,
    {
        let result = bridge
            .get_commit_history(&request.path, request.limit, request.skip)
            .await;
        self.apply(&request, result)
    }

    pub async fn load_initial<B>(&mut self, bridge: &B, path: &Path) -> Result<(), Error>
    where
        B: GitBridge + ?Sized,
    {
        let request = self.begin_load(path);
        self.fetch(bridge, request).await?;

        log::info!(
            "Loaded {} commit(s) of {}",
            self.pagination.total_loaded(),
            path.display()
        );
        Ok(())
    }

    /// Fetch the next page if `signal` calls for it. Returns whether a
    /// fetch was made.
    pub async fn load_more<B>(&mut self, bridge: &B, signal: LoadSignal) -> Result<bool, Error>
    where
        B: GitBridge + ?Sized,
    {
        let Some(request) = self.check_load_more(signal) else {
            return Ok(false);
        };
        self.fetch(bridge, request).await?;

        Ok(true)
    }

    /// Handle a key, then load more history if the cursor got close to the
    /// end of what is loaded. Returns whether the selected commit changed.
    /// A failed fetch is reported through [`GraphEvent::LoadFailed`] only.
    pub async fn navigate<B>(&mut self, bridge: &B, key: Key) -> bool
    where
        B: GitBridge + ?Sized,
    {
        let changed = self.handle_key(key);

        if let Some(row) = self.selected_row() {
            let signal = LoadSignal::Cursor {
                row,
                rows: self.layout.len(),
            };
            if let Err(e) = self.load_more(bridge, signal).await {
                log::debug!("Load after {key:?} failed: {e}");
            }
        }
        changed
    }

    // Selection.

    /// Select a visible commit. Returns `false` and leaves the selection
    /// alone if the commit is not loaded or is filtered out.
    pub fn select_commit(&mut self, id: &str) -> bool {
        self.try_select(id).is_ok()
    }

    pub fn try_select(&mut self, id: &str) -> Result<(), Error> {
        let transition = self
            .selection
            .select(id, self.layout.index())
            .map_err(|_| Error::NotFound(id.to_owned()))?;
        self.emit_transition(transition);

        Ok(())
    }

    /// Add a visible commit to the selection, or take it out.
    pub fn toggle_in_selection(&mut self, id: &str) -> bool {
        match self.selection.toggle(id, self.layout.index()) {
            Ok(transition) => {
                self.emit_transition(transition);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply a navigation key. Returns whether the selected commit changed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        let transition = self
            .selection
            .handle_key(key, self.layout.rows(), self.layout.index());
        self.emit_transition(transition)
    }

    pub fn selected_node(&self) -> Option<&Commit> {
        self.selection
            .primary()
            .and_then(|id| self.store.get(id.as_str()))
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.selection
            .primary()
            .and_then(|id| self.layout.row_of(id.as_str()))
    }

    /// Every selected commit, in row order.
    pub fn selected_commits(&self) -> Vec<&Commit> {
        let mut selected: Vec<(usize, &Commit)> = self
            .selection
            .multi()
            .iter()
            .filter_map(|id| Some((self.layout.row_of(id.as_str())?, self.store.get(id.as_str())?)))
            .collect();
        selected.sort_by_key(|(row, _)| *row);
        selected.into_iter().map(|(_, c)| c).collect()
    }

    // Branch visibility.

    pub fn available_branches(&self) -> AvailableBranches {
        AvailableBranches::from_refs(self.store.refs())
    }

    pub fn hidden_branches(&self) -> &BTreeSet<String> {
        self.visibility.hidden()
    }

    /// Flip whether `branch` is hidden. Returns the new hidden state.
    pub fn toggle_branch(&mut self, branch: &str) -> bool {
        let hidden = self.visibility.toggle(branch);
        self.relayout();
        hidden
    }

    pub fn show_all_branches(&mut self) {
        self.visibility.show_all();
        self.relayout();
    }

    pub fn hide_all_branches(&mut self) {
        let available = self.available_branches();
        self.visibility.hide_all(&available);
        self.relayout();
    }

    // Accessors.

    pub fn sorted_node_count(&self) -> usize {
        self.layout.len()
    }

    pub fn rows(&self) -> &[CommitId] {
        self.layout.rows()
    }

    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.layout.row_of(id)
    }

    pub fn lanes(&self) -> &Lanes {
        self.layout.lanes()
    }

    pub fn commit(&self, id: &str) -> Option<&Commit> {
        self.store.get(id)
    }

    pub fn refs_for(&self, id: &str) -> &[Ref] {
        self.store.refs_for(id)
    }

    pub fn store(&self) -> &CommitStore {
        &self.store
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
}
