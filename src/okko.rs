//! Okko (okko.tv) scraper.
//!
//! Search results and movie pages are plain server-rendered HTML, so both steps are
//! a single GET followed by a `scraper` pass. The class names below are Okko's
//! generated CSS module names; when the site is redeployed they can change, and the
//! affected field simply comes back as `None`.

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::fetch::fetch_html;
use crate::searcher::{MovieReport, MovieSearcher};

/// Shown in a `<p>` on the search page when nothing matched.
const NOT_FOUND_PHRASE: &str = "Увы, мы ничего не нашли";
/// Path segment that marks a content page link.
const MOVIE_PATH_MARKER: &str = "/movie/";

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css:?}: {e:?}"))
}

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("h1.LOjIO"));
static ALTERNATIVE_TITLE: Lazy<Selector> = Lazy::new(|| selector("h2._1lODb"));
static POSTER_SOURCE: Lazy<Selector> = Lazy::new(|| selector(r#"source[type="image/jpeg"]"#));
static DESCRIPTION_PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector("p._3Zh7s"));
static SPAN: Lazy<Selector> = Lazy::new(|| selector("span"));

pub struct OkkoSearcher {
    client: reqwest::Client,
    base_url: String,
    description_words: usize,
}

impl OkkoSearcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, description_words: usize) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            description_words,
        }
    }

    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search/{}",
            self.base_url,
            urlencoding::encode(&query.to_lowercase())
        )
    }
}

#[async_trait]
impl MovieSearcher for OkkoSearcher {
    fn platform(&self) -> &'static str {
        "Okko"
    }

    async fn link_from_query(&self, query: &str) -> Result<Option<String>> {
        let url = self.search_url(query);
        let html = fetch_html(&self.client, &url).await?;
        let link = parse_search_page(&html, &self.base_url);
        match &link {
            Some(link) => tracing::debug!(%url, %link, "search resolved to content page"),
            None => tracing::debug!(%url, "search page has no content link"),
        }
        Ok(link)
    }

    async fn info_from_link(&self, link: &str) -> Result<MovieReport> {
        let html = fetch_html(&self.client, link).await?;
        let report = parse_movie_page(&html, link, self.description_words);
        tracing::debug!(
            link,
            title = report.title.is_some(),
            alternative_title = report.alternative_title.is_some(),
            poster = report.poster_link.is_some(),
            description = report.description.is_some(),
            "extracted movie page"
        );
        Ok(report)
    }
}

// ============================================================================
// Search page
// ============================================================================

/// Find the first content page link on a search results page.
///
/// The "nothing found" banner wins over any links, since the page still carries
/// navigation and promo anchors when the search is empty.
pub fn parse_search_page(html: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let nothing_found = document
        .select(&PARAGRAPH)
        .any(|p| element_text(p).contains(NOT_FOUND_PHRASE));
    if nothing_found {
        tracing::debug!("search page reports nothing found");
        return None;
    }

    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(MOVIE_PATH_MARKER))
        .map(|href| absolute_link(base_url, href))
}

fn absolute_link(base_url: &str, href: &str) -> String {
    if href.starts_with("https://") || href.starts_with("http://") {
        href.to_string()
    } else {
        format!("{}{}", base_url, href)
    }
}

// ============================================================================
// Movie page
// ============================================================================

pub fn parse_movie_page(html: &str, link: &str, description_words: usize) -> MovieReport {
    let document = Html::parse_document(html);

    let title = first_text(&document, &TITLE).map(|t| strip_guillemets(&t).to_string());
    let alternative_title = first_text(&document, &ALTERNATIVE_TITLE);

    let poster_link = document
        .select(&POSTER_SOURCE)
        .next()
        .and_then(|source| source.value().attr("srcset"))
        .and_then(poster_from_srcset);

    let description = document
        .select(&DESCRIPTION_PARAGRAPH)
        .next()
        .and_then(|p| p.select(&SPAN).next())
        .map(|span| truncate_words(&element_text(span), description_words));

    MovieReport {
        title,
        alternative_title,
        poster_link,
        description,
        movie_link: Some(link.to_string()),
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().map(element_text)
}

/// `«Матрица» (1999)` -> `Матрица`. Anything not opening with `«` is left alone.
fn strip_guillemets(title: &str) -> &str {
    match (title.strip_prefix('«'), title.rfind('»')) {
        (Some(_), Some(end)) => &title['«'.len_utf8()..end],
        _ => title,
    }
}

/// Okko serves protocol-relative poster URLs (`//img.okko.tv/...`).
fn poster_from_srcset(srcset: &str) -> Option<String> {
    let first = srcset.split_whitespace().next()?.trim_end_matches(',');
    if let Some(rest) = first.strip_prefix("//") {
        return (!rest.is_empty()).then(|| format!("https://{}", rest));
    }
    if first.starts_with("https://") || first.starts_with("http://") {
        return Some(first.to_string());
    }
    None
}

fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().take(limit).collect();
    format!("{}...", words.join(" "))
}
