// src/bridge.rs

use crate::model::HistoryPage;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("backend task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Backend(String),
}

/// Asynchronous access to the Git engine that serves history.
#[async_trait::async_trait]
pub trait GitBridge: Send + Sync {
    /// Up to `limit` commits of the repository at `path`, newest first,
    /// after skipping the first `skip`, with the refs attached to them.
    async fn get_commit_history(
        &self,
        path: &Path,
        limit: usize,
        skip: usize,
    ) -> Result<HistoryPage, Error>;
}
