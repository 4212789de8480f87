//! League membership heuristic for extracted URLs.
//!
//! The detail-page URL space intermingles cups and neighbouring competitions
//! under overlapping path prefixes, and the site exposes no structured league
//! id on the rows. Membership is therefore decided by case-insensitive
//! substring containment: at least one accept token, none of the exclusion
//! tokens. The table lives behind this type so a stronger signal can replace
//! it without touching the collection loop.

use crate::config::CollectionTask;

/// Path fragments that identify competitions we never want: the locale
/// redirect segment, cup and international tournament slugs.
pub const EXCLUSION_TOKENS: &[&str] = &["/pl/", "saudi-arabia", "world-cup", "copa-"];

pub struct LeagueFilter {
    accept_tokens: Vec<String>,
    exclusions: Vec<String>,
}

impl LeagueFilter {
    pub fn new<T: Into<String>>(accept_tokens: Vec<T>, exclusions: Vec<T>) -> Self {
        Self {
            accept_tokens: accept_tokens
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
            exclusions: exclusions
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
        }
    }

    /// Tokens for one task: the dash-stripped league id and the country.
    /// The country token does most of the work since league slugs keep
    /// their dashes in detail URLs.
    pub fn for_task(task: &CollectionTask) -> Self {
        Self::new(
            vec![task.league_id.replace('-', ""), task.country.clone()],
            EXCLUSION_TOKENS.iter().map(|t| t.to_string()).collect(),
        )
    }

    pub fn accept(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        if !self.accept_tokens.iter().any(|t| url.contains(t)) {
            return false;
        }
        !self.exclusions.iter().any(|t| url.contains(t))
    }
}
