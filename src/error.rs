// src/error.rs

use crate::bridge;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to fetch history: {0}")]
    FetchFailure(#[from] bridge::Error),
    #[error("commit {0} is not in the visible history")]
    NotFound(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}
