// src/config.rs

use crate::sort::SortMode;
use serde::{Deserialize, Serialize};

/// Settings for a graph view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Commits requested by the first fetch of a repository.
    pub initial_page_size: usize,
    /// Commits requested by each following fetch.
    pub page_size: usize,
    /// Load more once the cursor is this many rows from the loaded tail.
    pub cursor_threshold_rows: usize,
    /// Load more once the viewport is this close to the bottom.
    pub scroll_threshold: f32,
    pub sort: SortMode,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            initial_page_size: 1000,
            page_size: 500,
            cursor_threshold_rows: 5,
            scroll_threshold: 200.0,
            sort: SortMode::Date,
        }
    }
}

impl GraphConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.initial_page_size == 0 || self.page_size == 0 {
            return Err(crate::Error::Config("page sizes must be positive".to_owned()));
        }
        if !self.scroll_threshold.is_finite() || self.scroll_threshold < 0.0 {
            return Err(crate::Error::Config(format!(
                "invalid scroll threshold {}",
                self.scroll_threshold
            )));
        }
        Ok(())
    }
}
