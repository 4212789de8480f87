//! Batch driver: walks the selected tasks sequentially with task-level
//! isolation, resuming past ledger-completed tasks, and persists partial
//! results on interrupt. One bad league-season never halts the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use tokio::signal;
use tokio::time::sleep;

use crate::cli::Cli;
use crate::collect::{collect_season, CollectOptions, CollectionOutcome, TaskStatus};
use crate::config::{self, CollectionTask};
use crate::fetch::HttpFetcher;
use crate::store::{self, ProgressLedger};
use crate::{info_time, warn_time, Result, TASK_DELAY_SECS};

pub async fn run(cli: Cli) -> Result<()> {
    if cli.list {
        print_available();
        return Ok(());
    }

    if let Some(recollection) = &cli.merge_recollection {
        let merged = merged_dir(&cli.out_dir);
        store::merge_recollection(&cli.out_dir, recollection, &merged)?;
        store::combine_csvs(&merged)?;
        return Ok(());
    }

    // Invalid selections error out here, before anything is touched.
    let tasks = config::derive_tasks(&cli.countries, &cli.seasons)?;
    run_batch(&cli, &tasks).await
}

async fn run_batch(cli: &Cli, tasks: &[CollectionTask]) -> Result<()> {
    fs::create_dir_all(&cli.out_dir)?;
    let mut ledger = ProgressLedger::load(&cli.out_dir)?;

    let opts = CollectOptions {
        max_retries: cli.retries,
        page_delay: Duration::from_millis(cli.delay_ms),
        max_pages: cli.max_pages,
        ..CollectOptions::default()
    };

    let total = tasks.len();
    info_time!("Starting batch run: {total} tasks");

    let mut outcomes: Vec<CollectionOutcome> = Vec::new();
    let mut interrupted = false;

    for (i, task) in tasks.iter().enumerate() {
        if ledger.is_completed(&task.key()) {
            info_time!("[{}/{total}] {} already completed, skipping", i + 1, task.key());
            continue;
        }
        info_time!("[{}/{total}] {} - {}", i + 1, task.league_name, task.season);

        // A keyboard interrupt lands between pages; whatever accumulated
        // so far still goes into the summary below.
        let outcome = tokio::select! {
            outcome = collect_season(HttpFetcher::new, task, &opts) => outcome,
            _ = signal::ctrl_c() => {
                warn_time!("interrupted, persisting partial results");
                interrupted = true;
                break;
            }
        };

        if !outcome.urls.is_empty() {
            store::write_season_csv(&cli.out_dir, &outcome)?;
        }
        ledger.record(&task.key(), &outcome)?;
        if outcome.status == TaskStatus::Failed {
            warn_time!(
                "{} - {} failed: {}",
                task.league_name,
                task.season,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        outcomes.push(outcome);

        if i + 1 < total {
            sleep(Duration::from_secs(TASK_DELAY_SECS)).await;
        }
    }

    store::write_summary(&cli.out_dir, &outcomes)?;
    if !interrupted {
        store::combine_csvs(&cli.out_dir)?;
    }

    let collected: usize = outcomes.iter().map(|o| o.urls.len()).sum();
    info_time!("Batch done: {} tasks ran, {collected} urls", outcomes.len());
    Ok(())
}

fn merged_dir(out_dir: &Path) -> PathBuf {
    PathBuf::from(format!("{}_merged", out_dir.display()))
}

fn print_available() {
    println!("Available leagues:");
    for league in config::LEAGUES {
        println!(
            "  {:<12} {} ({})",
            league.country,
            league.name,
            league.seasons.join(", ")
        );
    }
}
