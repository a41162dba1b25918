// src/pagination.rs

use crate::config::GraphConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Initial,
    More,
}

/// A history fetch to hand to the backend, tagged so that a response can be
/// matched against the state that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub path: PathBuf,
    pub limit: usize,
    pub skip: usize,
    pub kind: RequestKind,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing loaded yet.
    Unloaded,
    Idle,
    LoadingInitial,
    LoadingMore,
    /// The initial load failed; only a new initial load leaves this state.
    Failed,
}

/// Something that may mean the user is about to reach the end of history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadSignal {
    /// The viewport scrolled to within this distance of the bottom.
    Scroll { distance_from_bottom: f32 },
    /// The keyboard cursor is on `row` out of `rows` visible rows.
    Cursor { row: usize, rows: usize },
}

/// Tracks how much history is loaded and whether more can be fetched.
#[derive(Debug, Clone)]
pub struct Pagination {
    path: Option<PathBuf>,
    generation: u64,
    phase: Phase,
    total_loaded: usize,
    has_more: bool,
    initial_page_size: usize,
    page_size: usize,
    cursor_threshold: usize,
    scroll_threshold: f32,
}

impl Pagination {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            path: None,
            generation: 0,
            phase: Phase::Unloaded,
            total_loaded: 0,
            has_more: false,
            initial_page_size: config.initial_page_size,
            page_size: config.page_size,
            cursor_threshold: config.cursor_threshold_rows,
            scroll_threshold: config.scroll_threshold,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_loaded(&self) -> usize {
        self.total_loaded
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == Phase::LoadingMore
    }

    /// Start over on `path`. Responses to earlier requests become stale.
    /// Reloading the same path keeps the loaded count until the first page
    /// arrives, so a failed reload leaves the previous state in place.
    pub fn begin_initial(&mut self, path: &Path) -> HistoryRequest {
        self.generation += 1;
        if self.path.as_deref() != Some(path) {
            self.path = Some(path.to_path_buf());
            self.total_loaded = 0;
            self.has_more = false;
        }
        self.phase = Phase::LoadingInitial;

        HistoryRequest {
            path: path.to_path_buf(),
            limit: self.initial_page_size,
            skip: 0,
            kind: RequestKind::Initial,
            generation: self.generation,
        }
    }

    pub fn is_near_tail(&self, signal: LoadSignal) -> bool {
        match signal {
            LoadSignal::Scroll {
                distance_from_bottom,
            } => distance_from_bottom < self.scroll_threshold,
            LoadSignal::Cursor { row, rows } => row + self.cursor_threshold >= rows,
        }
    }

    /// Issue the next page request if `signal` is close enough to the tail,
    /// there is more history, and no other page is in flight.
    pub fn begin_more(&mut self, signal: LoadSignal) -> Option<HistoryRequest> {
        if self.phase != Phase::Idle || !self.has_more || !self.is_near_tail(signal) {
            return None;
        }
        let path = self.path.clone()?;
        self.phase = Phase::LoadingMore;

        Some(HistoryRequest {
            path,
            limit: self.page_size,
            skip: self.total_loaded,
            kind: RequestKind::More,
            generation: self.generation,
        })
    }

    /// Whether a response to `request` should still be applied.
    pub fn is_current(&self, request: &HistoryRequest) -> bool {
        let expected = match request.kind {
            RequestKind::Initial => Phase::LoadingInitial,
            RequestKind::More => Phase::LoadingMore,
        };
        request.generation == self.generation
            && self.path.as_deref() == Some(request.path.as_path())
            && self.phase == expected
    }

    /// Record a successful fetch of `returned` commits, `inserted` of which
    /// were new. Returns `false` if the response was stale and ignored.
    pub fn complete(&mut self, request: &HistoryRequest, returned: usize, inserted: usize) -> bool {
        if !self.is_current(request) {
            return false;
        }
        self.total_loaded = match request.kind {
            RequestKind::Initial => returned,
            RequestKind::More => self.total_loaded + returned,
        };
        // A full page of nothing but duplicates means the backend is not
        // making progress.
        self.has_more = returned >= request.limit && inserted > 0;
        self.phase = Phase::Idle;

        true
    }

    /// Record a failed fetch. Returns `false` if the response was stale.
    pub fn fail(&mut self, request: &HistoryRequest) -> bool {
        if !self.is_current(request) {
            return false;
        }
        self.phase = match request.kind {
            RequestKind::Initial if self.total_loaded == 0 => Phase::Failed,
            _ => Phase::Idle,
        };
        true
    }
}
