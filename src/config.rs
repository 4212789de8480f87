//! Static league tables and task derivation.
//!
//! The per-country maps used to be re-declared in every entry point; here
//! they live in one immutable table and task lists are derived by filtering.

use crate::{Error, Result};

/// Base origin of the target site; relative match links resolve against it.
pub const SITE_ORIGIN: &str = "https://www.oddsportal.com";

/// Split-year seasons used by most of the covered leagues.
const SPLIT_SEASONS: &[&str] = &[
    "2019-2020",
    "2020-2021",
    "2021-2022",
    "2022-2023",
    "2023-2024",
    "2024-2025",
];

/// Calendar-year seasons (Scandinavian leagues).
const YEAR_SEASONS: &[&str] = &["2019", "2020", "2021", "2022", "2023", "2024"];

pub struct League {
    pub country: &'static str,
    pub name: &'static str,
    /// Path segment of the league on the site, without country or season.
    pub league_id: &'static str,
    pub seasons: &'static [&'static str],
}

pub const LEAGUES: &[League] = &[
    League { country: "england", name: "England Premier League", league_id: "premier-league", seasons: SPLIT_SEASONS },
    League { country: "spain", name: "Spain La Liga", league_id: "laliga", seasons: SPLIT_SEASONS },
    League { country: "italy", name: "Italy Serie A", league_id: "serie-a", seasons: SPLIT_SEASONS },
    League { country: "germany", name: "Germany Bundesliga", league_id: "bundesliga", seasons: SPLIT_SEASONS },
    League { country: "france", name: "France Ligue 1", league_id: "ligue-1", seasons: SPLIT_SEASONS },
    League { country: "netherlands", name: "Netherlands Eredivisie", league_id: "eredivisie", seasons: SPLIT_SEASONS },
    League { country: "portugal", name: "Portugal Liga Portugal", league_id: "liga-portugal", seasons: SPLIT_SEASONS },
    League { country: "belgium", name: "Belgium Jupiler Pro League", league_id: "jupiler-pro-league", seasons: SPLIT_SEASONS },
    League { country: "scotland", name: "Scotland Premiership", league_id: "premiership", seasons: SPLIT_SEASONS },
    League { country: "switzerland", name: "Switzerland Super League", league_id: "super-league", seasons: SPLIT_SEASONS },
    League { country: "denmark", name: "Denmark Superliga", league_id: "superliga", seasons: SPLIT_SEASONS },
    League { country: "norway", name: "Norway Eliteserien", league_id: "eliteserien", seasons: YEAR_SEASONS },
    League { country: "sweden", name: "Sweden Allsvenskan", league_id: "allsvenskan", seasons: YEAR_SEASONS },
];

/// One (country, league, season) unit of collection work. Immutable once
/// derived from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTask {
    pub country: String,
    pub league_id: String,
    pub league_name: String,
    pub season: String,
}

impl CollectionTask {
    /// Ledger key for this task.
    pub fn key(&self) -> String {
        format!("{}_{}", self.league_id, self.season)
    }

    /// Page 1 of the season's results listing.
    pub fn base_url(&self) -> String {
        format!(
            "{SITE_ORIGIN}/football/{}/{}-{}/results/",
            self.country, self.league_id, self.season
        )
    }

    /// Pages past the first are addressed with a hash-routed page fragment.
    pub fn page_url(&self, page: usize) -> String {
        if page <= 1 {
            self.base_url()
        } else {
            format!("{}#/page/{page}/", self.base_url())
        }
    }
}

pub fn find_league(country: &str) -> Option<&'static League> {
    LEAGUES.iter().find(|l| l.country == country)
}

/// Derives the task list for a run. Empty selections mean "all".
/// Selection of a country or season not present in the table is an error;
/// a season selection only needs to exist for at least one selected country.
pub fn derive_tasks(countries: &[String], seasons: &[String]) -> Result<Vec<CollectionTask>> {
    for c in countries {
        if find_league(c).is_none() {
            return Err(Error::UnknownCountry(c.clone()));
        }
    }

    let mut tasks = Vec::new();
    for league in LEAGUES {
        if !countries.is_empty() && !countries.iter().any(|c| c == league.country) {
            continue;
        }
        for season in league.seasons {
            if !seasons.is_empty() && !seasons.iter().any(|s| s == season) {
                continue;
            }
            tasks.push(CollectionTask {
                country: league.country.to_string(),
                league_id: league.league_id.to_string(),
                league_name: league.name.to_string(),
                season: season.to_string(),
            });
        }
    }

    if tasks.is_empty() {
        if let Some(s) = seasons.first() {
            let country = countries
                .first()
                .cloned()
                .unwrap_or_else(|| "any country".to_string());
            return Err(Error::UnknownSeason {
                country,
                season: s.clone(),
            });
        }
    }
    Ok(tasks)
}
