// src/main.rs

mod cli;

use clap::Parser;
use cli::Args;
use git_lanes::visibility::JsonFileStore;
use git_lanes::{Git2Bridge, GraphEvent, GraphView, LoadSignal};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use std::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    let start_time = Instant::now();
    let bridge = Git2Bridge;
    let mut view = GraphView::new(args.config(), Box::new(JsonFileStore::new(args.state_file())))?;
    view.subscribe(|event| {
        if let GraphEvent::LoadFailed { message } = event {
            eprintln!("Error loading history: {message}");
        }
    });

    let repo = args.repo.canonicalize().unwrap_or_else(|_| args.repo.clone());
    view.load_initial(&bridge, &repo).await?;

    if args.all {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        bar.set_message(format!("{} commits", view.pagination().total_loaded()));

        // Pretend the viewport sits at the very bottom until history runs out.
        let bottom = LoadSignal::Scroll {
            distance_from_bottom: 0.0,
        };
        loop {
            match view.load_more(&bridge, bottom).await {
                Ok(true) => {
                    bar.set_message(format!("{} commits", view.pagination().total_loaded()));
                    bar.tick();
                }
                Ok(false) => break,
                // Already reported through the LoadFailed subscriber.
                Err(e) => {
                    log::debug!("Stopped paging: {e}");
                    break;
                }
            }
        }
        bar.finish_with_message(format!("{} commits loaded", view.pagination().total_loaded()));
    }

    if args.show_all {
        view.show_all_branches();
    }
    for branch in &args.hide {
        let hidden = view.toggle_branch(branch);
        log::info!("{branch} is now {}", if hidden { "hidden" } else { "shown" });
    }

    for line in git_lanes::renderer::render_rows(&view, args.limit_rows) {
        println!("{line}");
    }
    println!(
        "{} of {} loaded commits shown in {} lanes{} ({:.2?})",
        view.sorted_node_count(),
        view.store().len(),
        view.lanes().width(),
        if view.pagination().has_more() {
            ", more history available"
        } else {
            ""
        },
        start_time.elapsed()
    );

    Ok(())
}
