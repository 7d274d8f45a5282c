mod api;
mod config;
mod fetch;
mod okko;
mod platform;
mod searcher;

use dotenv::dotenv;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::SearchConfig;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::lookup,
        api::list_platforms,
        api::health
    ),
    components(
        schemas(
            api::LookupRequest,
            api::ErrorResponse,
            api::PlatformsResponse,
            searcher::MovieReport
        )
    ),
    tags(
        (name = "lookup", description = "Movie Lookup API")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = SearchConfig::from_env()?;
    let client = fetch::build_client(config.http_timeout)?;

    tracing::info!(
        okko = %config.okko_base_url,
        max_distance = config.max_distance,
        description_words = config.description_words,
        default_platform = %config.default_platform,
        "✅ Config loaded"
    );

    let port = config.port;
    let state = Arc::new(api::AppState { config, client });

    let app = api::router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
