//! Pagination resolution and match-link extraction over a loaded listing
//! document. Pure reads of the DOM, no side effects beyond logging.

use chrono::Local;
use scraper::{Html, Selector};
use url::Url;

use crate::config::SITE_ORIGIN;
use crate::{warn_time, Error, Result};

/// Marker text the site renders when a season has no listed matches.
/// Takes precedence over any stale pagination markup.
pub const NO_RESULTS_MARKER: &str = "Unfortunately, no matches can be displayed";

/// What the listing claims about its own page count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// The explicit "no results" marker is present; nothing to visit.
    NoResults,
    /// Pages 1..=n are available. No pagination controls resolves to 1.
    Pages(usize),
}

/// Determines the page count of a results listing.
///
/// The site routes pages through in-page hash fragments (`#/page/<n>/`), so
/// the page count is the largest index among those links. Links whose index
/// doesn't parse are ignored; if nothing parses the count is unknown and we
/// fall back to a single page, which still gets extraction attempted.
pub fn resolve_pagination(doc: &Html) -> Result<Pagination> {
    if has_no_results_marker(doc) {
        return Ok(Pagination::NoResults);
    }

    let page_link = create_selector(r##"a[href*="#/page/"]"##)?;
    let last = doc
        .select(&page_link)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(page_index_from_href)
        .max()
        .unwrap_or(1);

    Ok(Pagination::Pages(last.max(1)))
}

/// True when the listing shows the explicit empty-season marker.
pub fn has_no_results_marker(doc: &Html) -> bool {
    doc.root_element()
        .text()
        .any(|t| t.contains(NO_RESULTS_MARKER))
}

/// Extracts the match-detail URLs visible in the listing's event rows, in
/// document order. Each row yields at most its first anchor; rows without
/// one are skipped and counted, never abort the rest of the page.
pub fn extract_match_links(doc: &Html) -> Result<Vec<String>> {
    let row_selector = create_selector(r#"div[class*="eventRow"]"#)?;
    let game_anchor = create_selector(r#"div[data-testid="game-row"] a[href]"#)?;
    let any_anchor = create_selector("a[href]")?;

    let origin = Url::parse(SITE_ORIGIN)?;
    let mut links = Vec::new();
    let mut skipped = 0usize;

    for row in doc.select(&row_selector) {
        let anchor = row
            .select(&game_anchor)
            .next()
            .or_else(|| row.select(&any_anchor).next());

        let Some(href) = anchor.and_then(|a| a.value().attr("href")) else {
            skipped += 1;
            continue;
        };

        match origin.join(href) {
            Ok(url) => links.push(url.to_string()),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        warn_time!("{skipped} event rows yielded no usable link");
    }
    Ok(links)
}

fn page_index_from_href(href: &str) -> Option<usize> {
    let (_, tail) = href.rsplit_once("#/page/")?;
    tail.trim_end_matches('/').parse().ok()
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseInvalidSelector(sel_str.into()))
}
