use crate::config::SearchConfig;
use crate::okko::OkkoSearcher;
use crate::searcher::MovieSearcher;

/// Platform names accepted by [`searcher_for`].
pub const SUPPORTED: &[&str] = &["Okko"];

/// Everything a searcher needs to be built for one request.
pub struct SearchContext<'a> {
    pub client: &'a reqwest::Client,
    pub config: &'a SearchConfig,
}

/// Pick the searcher for a platform name.
///
/// Only Okko exists today; any other name is still served by Okko and logged, so
/// callers naming a platform we don't have get a result instead of an error.
pub fn searcher_for(platform: &str, ctx: &SearchContext<'_>) -> Box<dyn MovieSearcher> {
    let okko = || {
        Box::new(OkkoSearcher::new(
            ctx.client.clone(),
            ctx.config.okko_base_url.clone(),
            ctx.config.description_words,
        )) as Box<dyn MovieSearcher>
    };

    if is_okko(platform) {
        okko()
    } else {
        tracing::warn!(platform, "unknown platform, falling back to Okko");
        okko()
    }
}

fn is_okko(platform: &str) -> bool {
    // "Ökko" is how the chat keyboard labels it.
    matches!(platform.trim().to_lowercase().as_str(), "okko" | "ökko")
}
