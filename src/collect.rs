//! The collection loop: walks one league-season's listing pages in order,
//! with per-page retries, and accumulates a deduplicated, filtered list of
//! match URLs.
//!
//! Failed pages are retried at the same index rather than skipped: a failed
//! page is usually a transient rendering timeout, not missing data, and
//! skipping would produce an incomplete result that looks successful.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::config::CollectionTask;
use crate::fetch::PageFetcher;
use crate::filter::LeagueFilter;
use crate::parse::{self, Pagination};
use crate::{
    info_time, warn_time, Result, MAX_ERROR_LEN, MAX_RETRIES, PAGE_DELAY_SECS, RETRY_BACKOFF_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Success,
    NoData,
    Failed,
}

/// Result record for one task. Owned by the caller, persisted to the sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOutcome {
    pub country: String,
    pub league_id: String,
    pub league_name: String,
    pub season: String,
    pub status: TaskStatus,
    /// First-occurrence order, no duplicates, every entry passed the filter.
    pub urls: Vec<String>,
    /// Pages whose extraction completed.
    pub pages_found: usize,
    /// Page indices navigated, always a contiguous prefix 1..=m.
    pub pages_visited: Vec<usize>,
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// A page gets `max_retries + 1` attempts.
    pub max_retries: usize,
    pub retry_backoff: Duration,
    /// Delay between successfully completed pages.
    pub page_delay: Duration,
    /// Hard cap on pages per task, on top of what the listing claims.
    pub max_pages: Option<usize>,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retry_backoff: Duration::from_secs(RETRY_BACKOFF_SECS),
            page_delay: Duration::from_secs(PAGE_DELAY_SECS),
            max_pages: None,
        }
    }
}

/// Collects all match URLs for one league-season.
///
/// `make_fetcher` is called once per attempt; the fetcher is dropped when
/// the attempt ends, so every retry starts from a fresh connection. The
/// outcome always carries whatever accumulated before a failure.
pub async fn collect_season<P, F>(
    make_fetcher: F,
    task: &CollectionTask,
    opts: &CollectOptions,
) -> CollectionOutcome
where
    P: PageFetcher,
    F: Fn() -> Result<P>,
{
    info_time!("Collecting {} - {}", task.league_name, task.season);

    let filter = LeagueFilter::for_task(task);
    let mut seen: HashSet<String> = HashSet::new();
    let mut urls: Vec<String> = Vec::new();
    let mut pages_visited: Vec<usize> = Vec::new();
    let mut pages_found = 0usize;
    let mut status = TaskStatus::Success;
    let mut error = None;

    // Page count as claimed by page 1, resolved once before the loop.
    let mut total_pages: Option<usize> = None;
    let mut page = 1usize;

    'pages: loop {
        let url = task.page_url(page);

        // Retry the same page, never skip ahead past a failed one.
        let html = {
            let mut attempt = 0usize;
            loop {
                attempt += 1;
                match attempt_page(&make_fetcher, &url).await {
                    Ok(html) => break html,
                    Err(e) if e.is_transient() && attempt <= opts.max_retries => {
                        warn_time!(
                            "page {page} attempt {attempt}/{}: {e}; retrying",
                            opts.max_retries + 1
                        );
                        sleep(opts.retry_backoff).await;
                    }
                    Err(e) => {
                        if e.is_transient() {
                            warn_time!("page {page}: retry budget exhausted: {e}");
                        } else {
                            warn_time!("page {page}: non-retryable error: {e}");
                        }
                        status = TaskStatus::Failed;
                        error = Some(truncate_error(&e.to_string()));
                        break 'pages;
                    }
                }
            }
        };

        pages_visited.push(page);

        // Keep the parsed document out of any await scope.
        let links = {
            let doc = scraper::Html::parse_document(&html);

            if page == 1 {
                match parse::resolve_pagination(&doc) {
                    Ok(Pagination::NoResults) => {
                        info_time!("page 1: no results listed; nothing to collect");
                        break;
                    }
                    Ok(Pagination::Pages(n)) => {
                        let n = opts.max_pages.map_or(n, |cap| n.min(cap)).max(1);
                        total_pages = Some(n);
                        info_time!("listing claims {n} pages");
                    }
                    Err(e) => {
                        status = TaskStatus::Failed;
                        error = Some(truncate_error(&e.to_string()));
                        break;
                    }
                }
            } else if parse::has_no_results_marker(&doc) {
                // Normal terminating condition, not an error.
                info_time!("page {page}: no-results marker; stopping early");
                break;
            }

            match parse::extract_match_links(&doc) {
                Ok(links) => links,
                Err(e) => {
                    status = TaskStatus::Failed;
                    error = Some(truncate_error(&e.to_string()));
                    break;
                }
            }
        };

        if links.is_empty() {
            // Implicit end of data on an otherwise valid page.
            info_time!("page {page}: zero links; treating as end of data");
            break;
        }

        for link in links {
            if filter.accept(&link) && seen.insert(link.clone()) {
                urls.push(link);
            }
        }
        pages_found += 1;
        info_time!("page {page}: {} urls accumulated", urls.len());

        if page >= total_pages.unwrap_or(1) {
            break;
        }
        page += 1;
        sleep(opts.page_delay).await;
    }

    if status == TaskStatus::Success && urls.is_empty() {
        status = TaskStatus::NoData;
    }

    info_time!(
        "Done {} - {}: {:?}, {} urls from {} pages",
        task.league_name,
        task.season,
        status,
        urls.len(),
        pages_found
    );

    CollectionOutcome {
        country: task.country.clone(),
        league_id: task.league_id.clone(),
        league_name: task.league_name.clone(),
        season: task.season.clone(),
        status,
        urls,
        pages_found,
        pages_visited,
        error,
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// One attempt: acquire a fresh fetcher, load the page, release on return.
async fn attempt_page<P, F>(make_fetcher: &F, url: &str) -> Result<String>
where
    P: PageFetcher,
    F: Fn() -> Result<P>,
{
    let fetcher = make_fetcher()?;
    fetcher.fetch_listing(url).await
}

fn truncate_error(text: &str) -> String {
    if text.len() <= MAX_ERROR_LEN {
        text.to_string()
    } else {
        let cut: String = text.chars().take(MAX_ERROR_LEN).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::NO_RESULTS_MARKER;
    use crate::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    enum Step {
        Page(String),
        Timeout,
        Fatal,
    }

    #[derive(Default)]
    struct ScriptState {
        /// Per-URL response script; the last step repeats once exhausted.
        responses: HashMap<String, Vec<Step>>,
        calls: Vec<String>,
    }

    struct ScriptedFetcher {
        state: Arc<Mutex<ScriptState>>,
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_listing(&self, url: &str) -> Result<String> {
            let step = {
                let mut st = self.state.lock().unwrap();
                st.calls.push(url.to_string());
                let steps = st.responses.get_mut(url).unwrap_or_else(|| {
                    panic!("unscripted url: {url}");
                });
                if steps.len() > 1 {
                    steps.remove(0)
                } else {
                    steps[0].clone()
                }
            };
            match step {
                Step::Page(html) => Ok(html),
                Step::Timeout => Err(Error::NavigationTimeout(url.to_string())),
                Step::Fatal => Err(Error::ParseInvalidSelector("div[".into())),
            }
        }
    }

    fn task() -> CollectionTask {
        CollectionTask {
            country: "england".into(),
            league_id: "premier-league".into(),
            league_name: "England Premier League".into(),
            season: "2020-2021".into(),
        }
    }

    fn fast_opts() -> CollectOptions {
        CollectOptions {
            retry_backoff: Duration::ZERO,
            page_delay: Duration::ZERO,
            ..CollectOptions::default()
        }
    }

    fn match_href(n: usize) -> String {
        format!("/football/england/premier-league-2020-2021/home-away-{n}/")
    }

    fn listing_page(hrefs: &[String], total_pages: usize) -> String {
        let mut body = String::from("<html><body><main>");
        for href in hrefs {
            body.push_str(&format!(
                r#"<div class="eventRow flex"><div data-testid="game-row"><a href="{href}">match</a></div></div>"#
            ));
        }
        if total_pages > 1 {
            for p in 1..=total_pages {
                body.push_str(&format!(r##"<a href="#/page/{p}/">{p}</a>"##));
            }
        }
        body.push_str("</main></body></html>");
        body
    }

    fn no_results_page() -> String {
        format!("<html><body><main><div>{NO_RESULTS_MARKER}</div></main></body></html>")
    }

    fn distinct_pages(pages: usize, links_per_page: usize) -> HashMap<String, Vec<Step>> {
        let t = task();
        let mut responses = HashMap::new();
        for p in 1..=pages {
            let hrefs: Vec<String> = (0..links_per_page)
                .map(|i| match_href(p * 100 + i))
                .collect();
            responses.insert(t.page_url(p), vec![Step::Page(listing_page(&hrefs, pages))]);
        }
        responses
    }

    async fn run(responses: HashMap<String, Vec<Step>>) -> (CollectionOutcome, Arc<Mutex<ScriptState>>) {
        run_with(responses, fast_opts()).await
    }

    async fn run_with(
        responses: HashMap<String, Vec<Step>>,
        opts: CollectOptions,
    ) -> (CollectionOutcome, Arc<Mutex<ScriptState>>) {
        let state = Arc::new(Mutex::new(ScriptState {
            responses,
            calls: Vec::new(),
        }));
        let factory_state = state.clone();
        let outcome = collect_season(
            move || {
                Ok(ScriptedFetcher {
                    state: factory_state.clone(),
                })
            },
            &task(),
            &opts,
        )
        .await;
        (outcome, state)
    }

    fn attempts_for(state: &Arc<Mutex<ScriptState>>, url: &str) -> usize {
        state.lock().unwrap().calls.iter().filter(|c| *c == url).count()
    }

    #[tokio::test]
    async fn three_pages_all_succeed() {
        let (outcome, _) = run(distinct_pages(3, 5)).await;
        assert_eq!(outcome.status, TaskStatus::Success);
        assert_eq!(outcome.pages_found, 3);
        assert_eq!(outcome.pages_visited, vec![1, 2, 3]);
        assert_eq!(outcome.urls.len(), 15);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn early_stop_when_a_page_signals_no_results() {
        let t = task();
        let mut responses = distinct_pages(5, 4);
        responses.insert(t.page_url(3), vec![Step::Page(no_results_page())]);
        let (outcome, state) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::Success);
        assert_eq!(outcome.pages_visited, vec![1, 2, 3]);
        assert_eq!(outcome.urls.len(), 8); // pages 1 and 2 only
        assert_eq!(attempts_for(&state, &t.page_url(4)), 0);
        assert_eq!(attempts_for(&state, &t.page_url(5)), 0);
    }

    #[tokio::test]
    async fn transient_failure_then_recovery_keeps_the_page() {
        let t = task();
        let mut responses = distinct_pages(3, 5);
        let page2 = responses.get(&t.page_url(2)).unwrap()[0].clone();
        responses.insert(t.page_url(2), vec![Step::Timeout, page2]);
        let (outcome, state) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::Success);
        assert_eq!(outcome.urls.len(), 15);
        assert_eq!(attempts_for(&state, &t.page_url(2)), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_fail_the_task_but_keep_earlier_pages() {
        let t = task();
        let mut responses = distinct_pages(3, 5);
        responses.insert(t.page_url(2), vec![Step::Timeout]);
        let (outcome, state) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(outcome.urls.len(), 5); // page 1 only
        assert_eq!(outcome.pages_found, 1);
        assert_eq!(outcome.pages_visited, vec![1]);
        assert!(outcome.error.is_some());
        // Budget respected: 1 initial attempt + MAX_RETRIES retries.
        assert_eq!(attempts_for(&state, &t.page_url(2)), MAX_RETRIES + 1);
        assert_eq!(attempts_for(&state, &t.page_url(3)), 0);
    }

    #[tokio::test]
    async fn non_retryable_error_aborts_without_retrying() {
        let t = task();
        let mut responses = distinct_pages(3, 5);
        responses.insert(t.page_url(2), vec![Step::Fatal]);
        let (outcome, state) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::Failed);
        assert_eq!(attempts_for(&state, &t.page_url(2)), 1);
        assert_eq!(outcome.urls.len(), 5);
    }

    #[tokio::test]
    async fn rerun_against_unchanged_listing_is_idempotent() {
        let (first, _) = run(distinct_pages(3, 5)).await;
        let (second, _) = run(distinct_pages(3, 5)).await;
        assert_eq!(first.urls, second.urls);
    }

    #[tokio::test]
    async fn duplicates_across_pages_are_dropped_keeping_first_occurrence() {
        let t = task();
        let mut responses = distinct_pages(2, 3);
        // Page 2 repeats page 1's links before contributing a new one.
        let mut hrefs: Vec<String> = (0..3).map(|i| match_href(100 + i)).collect();
        hrefs.push(match_href(999));
        responses.insert(t.page_url(2), vec![Step::Page(listing_page(&hrefs, 2))]);
        let (outcome, _) = run(responses).await;

        assert_eq!(outcome.urls.len(), 4);
        let unique: std::collections::HashSet<_> = outcome.urls.iter().collect();
        assert_eq!(unique.len(), outcome.urls.len());
        assert!(outcome.urls[0].contains("home-away-100"));
        assert!(outcome.urls[3].contains("home-away-999"));
    }

    #[tokio::test]
    async fn every_accepted_url_passes_the_filter() {
        let t = task();
        let mut hrefs: Vec<String> = (0..3).map(match_href).collect();
        hrefs.push("/football/world-cup/england-germany-x/".into());
        hrefs.push("/football/germany/bundesliga-2020-2021/other-y/".into());
        let responses =
            HashMap::from([(t.page_url(1), vec![Step::Page(listing_page(&hrefs, 1))])]);
        let (outcome, _) = run(responses).await;

        let filter = LeagueFilter::for_task(&t);
        assert_eq!(outcome.urls.len(), 3);
        assert!(outcome.urls.iter().all(|u| filter.accept(u)));
    }

    #[tokio::test]
    async fn zero_links_on_a_valid_page_ends_the_season() {
        let t = task();
        let mut responses = distinct_pages(3, 5);
        responses.insert(t.page_url(2), vec![Step::Page(listing_page(&[], 3))]);
        let (outcome, state) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::Success);
        assert_eq!(outcome.urls.len(), 5);
        assert_eq!(outcome.pages_visited, vec![1, 2]);
        assert_eq!(attempts_for(&state, &t.page_url(3)), 0);
    }

    #[tokio::test]
    async fn no_results_on_page_one_yields_no_data() {
        let t = task();
        let responses = HashMap::from([(t.page_url(1), vec![Step::Page(no_results_page())])]);
        let (outcome, _) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::NoData);
        assert!(outcome.urls.is_empty());
        assert_eq!(outcome.pages_visited, vec![1]);
    }

    #[tokio::test]
    async fn listing_without_pagination_controls_is_a_single_page() {
        let t = task();
        let hrefs: Vec<String> = (0..4).map(match_href).collect();
        let responses =
            HashMap::from([(t.page_url(1), vec![Step::Page(listing_page(&hrefs, 1))])]);
        let (outcome, state) = run(responses).await;

        assert_eq!(outcome.status, TaskStatus::Success);
        assert_eq!(outcome.urls.len(), 4);
        assert_eq!(state.lock().unwrap().calls.len(), 1);
    }

    #[tokio::test]
    async fn max_pages_cap_limits_the_walk() {
        let responses = distinct_pages(5, 2);
        let opts = CollectOptions {
            max_pages: Some(2),
            ..fast_opts()
        };
        let (outcome, state) = run_with(responses, opts).await;

        assert_eq!(outcome.pages_visited, vec![1, 2]);
        assert_eq!(outcome.urls.len(), 4);
        assert_eq!(attempts_for(&state, &task().page_url(3)), 0);
    }
}
