// src/renderer.rs

use crate::lanes::Lanes;
use crate::model::CommitId;
use crate::store::CommitStore;
use crate::view::GraphView;
use rayon::prelude::*;

/// Text rendition of the first `limit` rows: a lane gutter with `*` for the
/// commit and `|` for lines passing through, then id, refs, date and summary.
pub fn render_rows(view: &GraphView, limit: usize) -> Vec<String> {
    let rows = &view.rows()[..view.rows().len().min(limit)];
    render(rows, view.lanes(), view.store())
}

fn render(rows: &[CommitId], lanes: &Lanes, store: &CommitStore) -> Vec<String> {
    let passing = lanes.passing(rows.len());
    let width = lanes.width().max(1);

    rows.par_iter()
        .enumerate()
        .map(|(row, id)| {
            let mut gutter = vec![' '; width];
            for &lane in &passing[row] {
                gutter[lane] = '|';
            }
            if let Some(info) = lanes.get(id.as_str()) {
                gutter[info.lane] = '*';
            }
            let gutter: String = gutter.into_iter().flat_map(|c| [c, ' ']).collect();

            let Some(commit) = store.get(id.as_str()) else {
                return format!("{gutter}{}", id.short());
            };
            let date = commit
                .committer
                .datetime()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let refs = store.refs_for(id.as_str());
            let labels = if refs.is_empty() {
                String::new()
            } else {
                let names: Vec<String> = refs
                    .iter()
                    .map(|r| {
                        if r.is_head {
                            format!("HEAD -> {}", r.shorthand)
                        } else {
                            r.shorthand.clone()
                        }
                    })
                    .collect();
                format!("({}) ", names.join(", "))
            };

            format!(
                "{gutter}{} {date} {labels}{}",
                commit.short_id(),
                commit.summary
            )
        })
        .collect()
}
