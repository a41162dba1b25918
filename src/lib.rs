// src/lib.rs

//! Commit graph layout and navigation.
//!
//! History is fetched page by page through a [`GitBridge`], merged into a
//! deduplicating [`CommitStore`], ordered into rows and assigned lanes for
//! drawing. A [`GraphView`] ties this together with keyboard selection and a
//! persisted per-repository branch filter.

pub mod bridge;
pub mod config;
pub mod error;
pub mod git;
pub mod lanes;
pub mod layout;
pub mod model;
pub mod pagination;
pub mod renderer;
pub mod selection;
pub mod sort;
pub mod store;
pub mod view;
pub mod visibility;

pub use bridge::GitBridge;
pub use config::GraphConfig;
pub use error::Error;
pub use git::Git2Bridge;
pub use model::{Commit, CommitId, HistoryPage, Ref, RefKind, RefsByCommit, Signature};
pub use pagination::{LoadSignal, Pagination};
pub use selection::Key;
pub use sort::SortMode;
pub use store::CommitStore;
pub use view::{GraphEvent, GraphView};
