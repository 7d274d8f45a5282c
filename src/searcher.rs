use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::DEFAULT_MAX_DISTANCE;

// ============================================================================
// Report
// ============================================================================

/// Movie metadata scraped from one content page.
///
/// Every field is independent: a page missing its poster still yields a title.
/// The all-`None` value doubles as the "nothing found" answer.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, ToSchema)]
pub struct MovieReport {
    pub title: Option<String>,
    pub alternative_title: Option<String>,
    pub poster_link: Option<String>,
    pub description: Option<String>,
    pub movie_link: Option<String>,
}

impl MovieReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Searcher trait
// ============================================================================

/// One streaming platform: turns a query into a page link, and a page into a report.
#[async_trait]
pub trait MovieSearcher: Send + Sync {
    /// Platform name, used in logs.
    fn platform(&self) -> &'static str;

    /// Resolve a free-text query into the link of a content page.
    /// `Ok(None)` means the platform has nothing for the query.
    async fn link_from_query(&self, query: &str) -> Result<Option<String>>;

    /// Scrape a content page. Missing page elements become `None` fields, never errors.
    async fn info_from_link(&self, link: &str) -> Result<MovieReport>;
}

// ============================================================================
// Acceptance gate
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub max_distance: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// Case-insensitive Levenshtein distance between a query and a title.
pub fn title_distance(query: &str, title: &str) -> usize {
    strsim::levenshtein(&query.to_lowercase(), &title.to_lowercase())
}

/// True when the title is strictly closer than `max_distance` edits to the query.
pub fn title_matches(query: &str, title: &str, max_distance: usize) -> bool {
    title_distance(query, title) < max_distance
}

fn accepts(report: &MovieReport, query: &str, policy: &MatchPolicy) -> bool {
    let check = |candidate: &Option<String>| {
        candidate.as_deref().map_or(false, |title| {
            let distance = title_distance(query, title);
            let matched = distance < policy.max_distance;
            tracing::debug!(
                candidate = title,
                distance,
                matched,
                "title compared"
            );
            matched
        })
    };

    // Both sides are evaluated so the debug log shows each distance.
    let title_match = check(&report.title);
    let alternative_match = check(&report.alternative_title);
    title_match || alternative_match
}

/// Run the full pipeline: resolve, extract, then keep the report only if one of its
/// titles is close to the query. Transport failures propagate; everything else
/// that isn't a confident match becomes the empty report.
pub async fn lookup(
    searcher: &dyn MovieSearcher,
    query: &str,
    policy: &MatchPolicy,
) -> Result<MovieReport> {
    let link = match searcher.link_from_query(query).await? {
        Some(link) => link,
        None => {
            tracing::info!(platform = searcher.platform(), "no content link for query");
            return Ok(MovieReport::default());
        }
    };

    let report = searcher.info_from_link(&link).await?;

    if accepts(&report, query, policy) {
        tracing::info!(
            platform = searcher.platform(),
            link = %link,
            title = report.title.as_deref().unwrap_or_default(),
            "report accepted"
        );
        Ok(report)
    } else {
        tracing::info!(
            platform = searcher.platform(),
            link = %link,
            title = report.title.as_deref().unwrap_or_default(),
            alternative_title = report.alternative_title.as_deref().unwrap_or_default(),
            "report rejected by title match"
        );
        Ok(MovieReport::default())
    }
}
