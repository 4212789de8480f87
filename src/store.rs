//! Result sinks: per-season CSVs, the progress ledger, the summary report
//! and the recollection merge.
//!
//! Layout under the output directory:
//!   by_league/<country>/<season>.csv     one row per accepted URL
//!   combined/all_matches_combined.csv    concatenation of the above
//!   progress.json                        ledger keyed "<league_id>_<season>"
//!   collection_summary.txt               human-readable report
//!   final_results.json                   machine-readable outcomes

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::collect::{CollectionOutcome, TaskStatus};
use crate::{info_time, Result};

pub const CSV_HEADER: [&str; 3] = ["league", "season", "match_url"];

/// Writes one task's accepted URLs to `by_league/<country>/<season>.csv`.
pub fn write_season_csv(out_dir: &Path, outcome: &CollectionOutcome) -> Result<PathBuf> {
    let dir = out_dir.join("by_league").join(&outcome.country);
    fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.csv", outcome.season));

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(CSV_HEADER)?;
    for url in &outcome.urls {
        writer.write_record([&outcome.league_name, &outcome.season, url])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Concatenates every per-season CSV into `combined/all_matches_combined.csv`.
pub fn combine_csvs(out_dir: &Path) -> Result<PathBuf> {
    let combined_dir = out_dir.join("combined");
    fs::create_dir_all(&combined_dir)?;
    let path = combined_dir.join("all_matches_combined.csv");

    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(CSV_HEADER)?;

    for csv_path in season_csvs(&out_dir.join("by_league"))? {
        let mut reader = csv::Reader::from_path(&csv_path)?;
        for record in reader.records() {
            writer.write_record(&record?)?;
        }
    }
    writer.flush()?;
    Ok(path)
}

/// All season CSVs under a `by_league` tree, sorted for stable output.
fn season_csvs(by_league: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    if !by_league.exists() {
        return Ok(paths);
    }
    for country in fs::read_dir(by_league)? {
        let country = country?.path();
        if !country.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&country)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "csv") {
                paths.push(path);
            }
        }
    }
    paths.sort();
    Ok(paths)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub completed: bool,
    pub timestamp: String,
    pub urls_count: usize,
}

/// On-disk progress ledger, read at start and rewritten after every task so
/// a crashed run can resume without recollecting completed tasks. No
/// locking: parallel processes own disjoint task keys by construction.
pub struct ProgressLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl ProgressLedger {
    pub fn load(out_dir: &Path) -> Result<Self> {
        let path = out_dir.join("progress.json");
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    pub fn is_completed(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.completed)
    }

    /// Records a task's outcome and persists the ledger. Failed tasks are
    /// recorded as not completed so a re-run picks them up again.
    pub fn record(&mut self, key: &str, outcome: &CollectionOutcome) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            LedgerEntry {
                completed: outcome.status != TaskStatus::Failed,
                timestamp: Utc::now().to_rfc3339(),
                urls_count: outcome.urls.len(),
            },
        );
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// Writes the human-readable summary and the machine-readable outcome list.
/// The summary is what an operator re-reads to decide which tasks need a
/// recollection run.
pub fn write_summary(out_dir: &Path, outcomes: &[CollectionOutcome]) -> Result<()> {
    fs::create_dir_all(out_dir)?;

    let total_urls: usize = outcomes.iter().map(|o| o.urls.len()).sum();
    let count = |s: TaskStatus| outcomes.iter().filter(|o| o.status == s).count();

    let mut text = String::new();
    text.push_str(&"=".repeat(70));
    text.push_str("\nMATCH URL COLLECTION SUMMARY\n");
    text.push_str(&"=".repeat(70));
    text.push_str(&format!(
        "\nGenerated: {}\n\nTotal tasks: {}\nSuccessful: {}\nFailed: {}\nNo data: {}\nTotal matches collected: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        outcomes.len(),
        count(TaskStatus::Success),
        count(TaskStatus::Failed),
        count(TaskStatus::NoData),
        total_urls,
    ));

    text.push_str("\nBY TASK:\n");
    text.push_str(&"-".repeat(50));
    text.push('\n');
    for o in outcomes {
        let status = match o.status {
            TaskStatus::Success => "success",
            TaskStatus::NoData => "no_data",
            TaskStatus::Failed => "FAILED",
        };
        text.push_str(&format!(
            "{} {}: {} matches, {} pages [{status}]\n",
            o.league_name,
            o.season,
            o.urls.len(),
            o.pages_found,
        ));
    }

    let failed: Vec<_> = outcomes
        .iter()
        .filter(|o| o.status == TaskStatus::Failed)
        .collect();
    if !failed.is_empty() {
        text.push_str("\nFAILED TASKS:\n");
        for o in &failed {
            text.push_str(&format!(
                "  - {} {}: {}\n",
                o.league_name,
                o.season,
                o.error.as_deref().unwrap_or("unknown error"),
            ));
        }
    }

    fs::write(out_dir.join("collection_summary.txt"), &text)?;
    fs::write(
        out_dir.join("final_results.json"),
        serde_json::to_string_pretty(outcomes)?,
    )?;
    info_time!("Summary written to {}", out_dir.display());
    Ok(())
}

/// Merges a recollection run into an earlier collection.
///
/// For every (country, season) CSV present under the recollection directory
/// the recollected file replaces the original wholesale; recollections exist
/// to correct systematic miscounts, so this is a replace, never a union.
/// Originals without a recollected counterpart are carried over unchanged.
/// Returns the number of season files taken from the recollection.
pub fn merge_recollection(original: &Path, recollection: &Path, merged: &Path) -> Result<usize> {
    let mut replaced = 0usize;

    let mut sources: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();
    for path in season_csvs(&original.join("by_league"))? {
        if let Ok(rel) = path.strip_prefix(original) {
            sources.insert(rel.to_path_buf(), path.clone());
        }
    }
    for path in season_csvs(&recollection.join("by_league"))? {
        if let Ok(rel) = path.strip_prefix(recollection) {
            if sources.insert(rel.to_path_buf(), path.clone()).is_some() {
                replaced += 1;
            }
        }
    }

    for (rel, source) in &sources {
        let dest = merged.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, &dest)?;
    }

    info_time!(
        "Merged {} season files into {} ({replaced} superseded by recollection)",
        sources.len(),
        merged.display()
    );
    Ok(replaced)
}
