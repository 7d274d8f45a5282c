use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::platform::{self, SearchContext};
use crate::searcher::{self, MatchPolicy, MovieReport};

pub struct AppState {
    pub config: SearchConfig,
    pub client: reqwest::Client,
}

#[derive(Deserialize, ToSchema)]
pub struct LookupRequest {
    /// Free text from the chat message, e.g. "Матрица".
    pub query: String,
    /// Platform name; the configured default when omitted.
    pub platform: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PlatformsResponse {
    pub platforms: Vec<String>,
    pub default: String,
}

pub enum ApiError {
    BadRequest(String),
    Upstream(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Upstream(e) => (StatusCode::BAD_GATEWAY, format!("{:#}", e)),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/lookup", post(lookup))
        .route("/platforms", get(list_platforms))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Look a movie up on a platform
///
/// An all-null report means nothing matching the query was found.
#[utoipa::path(
    post,
    path = "/lookup",
    request_body = LookupRequest,
    responses(
        (status = 200, description = "Lookup finished", body = MovieReport),
        (status = 400, description = "Empty query", body = ErrorResponse),
        (status = 502, description = "Platform could not be fetched", body = ErrorResponse)
    ),
    tag = "lookup"
)]
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LookupRequest>,
) -> Result<Json<MovieReport>, ApiError> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".to_string()));
    }

    let platform = payload
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(state.config.default_platform.as_str());

    let lookup_id = Uuid::new_v4();
    let span = tracing::info_span!("lookup", %lookup_id, platform, query);

    async {
        let ctx = SearchContext {
            client: &state.client,
            config: &state.config,
        };
        let searcher = platform::searcher_for(platform, &ctx);
        let policy = MatchPolicy {
            max_distance: state.config.max_distance,
        };

        match searcher::lookup(searcher.as_ref(), query, &policy).await {
            Ok(report) => {
                tracing::info!(found = !report.is_empty(), "lookup finished");
                Ok(Json(report))
            }
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "lookup failed");
                Err(ApiError::Upstream(e))
            }
        }
    }
    .instrument(span)
    .await
}

/// List supported platforms
#[utoipa::path(
    get,
    path = "/platforms",
    responses((status = 200, description = "Supported platforms", body = PlatformsResponse)),
    tag = "lookup"
)]
pub async fn list_platforms(State(state): State<Arc<AppState>>) -> Json<PlatformsResponse> {
    Json(PlatformsResponse {
        platforms: platform::SUPPORTED.iter().map(|p| p.to_string()).collect(),
        default: state.config.default_platform.clone(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String)),
    tag = "lookup"
)]
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::build_client;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(base_url: &str) -> Router {
        app_with_timeout(base_url, Duration::from_secs(5))
    }

    fn app_with_timeout(base_url: &str, timeout: Duration) -> Router {
        let config = SearchConfig {
            okko_base_url: base_url.to_string(),
            http_timeout: timeout,
            ..SearchConfig::default()
        };
        let client = build_client(config.http_timeout).unwrap();
        router(Arc::new(AppState { config, client }))
    }

    fn post_lookup(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/lookup")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn stub_okko(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(format!("/search/{}", urlencoding::encode("матрица"))))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<a href="/movie/matrix">Матрица</a>"#,
                "text/html; charset=utf-8",
            ))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/movie/matrix"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<h1 class="LOjIO">«Матрица» (1999)</h1><h2 class="_1lODb">The Matrix</h2>"#,
                "text/html; charset=utf-8",
            ))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn lookup_returns_accepted_report() {
        let server = MockServer::start().await;
        stub_okko(&server).await;

        let (status, body) = send(
            app(&server.uri()),
            post_lookup(serde_json::json!({ "query": "  Матрица ", "platform": "Ökko" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Матрица");
        assert_eq!(body["alternative_title"], "The Matrix");
        assert_eq!(body["poster_link"], serde_json::Value::Null);
        assert_eq!(body["movie_link"], format!("{}/movie/matrix", server.uri()));
    }

    #[tokio::test]
    async fn lookup_without_match_is_an_empty_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>Увы, мы ничего не нашли</p>", "text/html"),
            )
            .mount(&server)
            .await;

        let (status, body) = send(
            app(&server.uri()),
            post_lookup(serde_json::json!({ "query": "qwerty" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let report: MovieReport = serde_json::from_value(body).unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let (status, body) = send(
            app("http://127.0.0.1:9"),
            post_lookup(serde_json::json!({ "query": "   " })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "query must not be empty");
    }

    #[tokio::test]
    async fn unreachable_platform_is_a_bad_gateway() {
        let (status, body) = send(
            app("http://127.0.0.1:9"),
            post_lookup(serde_json::json!({ "query": "матрица" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("127.0.0.1:9"));
    }

    #[tokio::test]
    async fn stalled_platform_is_a_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>late</p>", "text/html")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let (status, body) = send(
            app_with_timeout(&server.uri(), Duration::from_millis(300)),
            post_lookup(serde_json::json!({ "query": "матрица" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("/search/"));
    }

    #[tokio::test]
    async fn platforms_lists_okko() {
        let req = Request::builder().uri("/platforms").body(Body::empty()).unwrap();
        let (status, body) = send(app("http://127.0.0.1:9"), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["platforms"], serde_json::json!(["Okko"]));
        assert_eq!(body["default"], "Okko");
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = app("http://127.0.0.1:9").oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }
}
