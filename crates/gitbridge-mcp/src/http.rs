//! HTTP surface of the gateway.
//!
//! Routes:
//! - `GET /mcp`: SSE session when the client accepts `text/event-stream`,
//!   the discovery document otherwise
//! - `POST /mcp`: JSON-RPC dispatch
//! - `GET /mcp-sse`: deprecated, redirects to `/mcp`
//! - `POST /analyze-repo`: repository analysis as a JSON-RPC envelope
//! - `GET /health`

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use sysinfo::System;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::protocol::{
    decode_request_slice, parse_json, JsonRpcError, JsonRpcResponse, RequestId, RequestRejection,
};
use crate::sse::{SessionTiming, SseSession};

/// Default id of `/analyze-repo` responses when the body has none.
const ANALYZE_DEFAULT_ID: &str = "analyze_1";

/// Shared state of every route.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    pub timing: SessionTiming,
    started: Instant,
}

impl GatewayState {
    pub fn new(dispatcher: Arc<Dispatcher>, timing: SessionTiming) -> Self {
        Self {
            dispatcher,
            timing,
            started: Instant::now(),
        }
    }
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/mcp", get(mcp_get).post(mcp_post))
        .route("/mcp-sse", get(mcp_sse_redirect))
        .route("/analyze-repo", post(analyze_repo))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn wants_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/event-stream"))
}

/// Malformed JSON is the one failure answered with HTTP 400.
fn malformed_body(rejection: RequestRejection) -> Response {
    tracing::debug!(error = %rejection.error, "Malformed JSON body");
    (StatusCode::BAD_REQUEST, Json(rejection.into_response())).into_response()
}

async fn mcp_get(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if !wants_event_stream(&headers) {
        return Json(state.dispatcher.discovery()).into_response();
    }

    let dispatcher = &state.dispatcher;
    let (rx, _session) = SseSession::spawn(
        dispatcher.server_info(),
        dispatcher.discovery(),
        state.timing,
    );

    let stream =
        ReceiverStream::new(rx).map(|notification| Event::default().json_data(notification));

    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (header::CONNECTION, HeaderValue::from_static("keep-alive")),
            (
                header::HeaderName::from_static("x-accel-buffering"),
                HeaderValue::from_static("no"),
            ),
        ],
        Sse::new(stream),
    )
        .into_response()
}

async fn mcp_post(State(state): State<GatewayState>, body: Bytes) -> Response {
    match decode_request_slice(&body) {
        Err(rejection) if rejection.is_parse_error() => malformed_body(rejection),
        decoded => Json(state.dispatcher.dispatch_decoded(decoded).await).into_response(),
    }
}

async fn mcp_sse_redirect() -> Redirect {
    Redirect::temporary("/mcp")
}

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    #[serde(default)]
    id: Option<RequestId>,
    #[serde(default)]
    params: Option<AnalyzeParams>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeParams {
    owner: Option<String>,
    repo: Option<String>,
    prompt: Option<String>,
}

async fn analyze_repo(State(state): State<GatewayState>, body: Bytes) -> Response {
    let raw = match parse_json(&body) {
        Ok(raw) => raw,
        Err(rejection) => return malformed_body(rejection),
    };

    let body: AnalyzeBody = match serde_json::from_value(raw) {
        Ok(body) => body,
        Err(e) => {
            let envelope = JsonRpcResponse::error(
                RequestId::from(ANALYZE_DEFAULT_ID),
                JsonRpcError::invalid_params(&e.to_string()),
            );
            return Json(envelope).into_response();
        }
    };

    let id = match body.id {
        Some(RequestId::Null) | None => RequestId::from(ANALYZE_DEFAULT_ID),
        Some(id) => id,
    };
    let params = body.params.unwrap_or_default();

    let (owner, repo) = match (params.owner.as_deref(), params.repo.as_deref()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => (owner, repo),
        _ => {
            let error = JsonRpcError::new(
                JsonRpcError::INVALID_PARAMS,
                "Missing required parameters: owner and repo",
            );
            return Json(JsonRpcResponse::error(id, error)).into_response();
        }
    };

    let analyzer = state.dispatcher.invoker().analyzer();
    let outcome = analyzer
        .analyze(owner, repo, params.prompt.as_deref())
        .await
        .and_then(|analysis| Ok(serde_json::to_value(&analysis)?));

    let envelope = match outcome {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            tracing::warn!(owner, repo, error = %e, "Repository analysis failed");
            let error = JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, e.to_string());
            JsonRpcResponse::error(id, error)
        }
    };

    Json(envelope).into_response()
}

async fn health(State(state): State<GatewayState>) -> Response {
    let info = state.dispatcher.server_info();
    let body = json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "uptime": state.started.elapsed().as_secs(),
        "system": system_snapshot(),
        "server": {
            "name": info.name,
            "version": info.version,
            "platform": format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
            "pid": std::process::id(),
        },
        "endpoints": {
            "mcp": "/mcp",
            "analyze": "/analyze-repo",
            "health": "/health",
        },
    });

    (
        [(
            header::HeaderName::from_static("x-health-check"),
            HeaderValue::from_static("passed"),
        )],
        Json(body),
    )
        .into_response()
}

/// Memory and CPU figures of the host, sampled per request.
fn system_snapshot() -> Value {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_all();

    let total = sys.total_memory();
    let available = sys.available_memory().min(total);
    let usage = if total > 0 {
        (total - available) * 100 / total
    } else {
        0
    };
    let load = System::load_average();

    json!({
        "memory": {
            "totalMb": total / 1_048_576,
            "freeMb": available / 1_048_576,
            "usagePercent": usage,
        },
        "cpu": {
            "cores": sys.cpus().len(),
            "model": sys.cpus().first().map(|cpu| cpu.brand().to_string()),
            "load": [load.one, load.five, load.fifteen],
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::RepositoryAnalyzer;
    use crate::invoker::UpstreamInvoker;
    use crate::protocol::ServerInfo;
    use crate::registry::ToolRegistry;
    use crate::test_support::{sample_repo, FakeLlm, MockRepos};
    use axum::body::Body;
    use axum::http::Request;
    use gitbridge_core::{IssueList, RepositoryProvider};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(repos: MockRepos) -> Router {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(repos);
        let analyzer = RepositoryAnalyzer::new(
            repos.clone(),
            Some(Arc::new(FakeLlm::answering("looks healthy"))),
            "m",
        );
        let dispatcher = Dispatcher::new(
            Arc::new(ToolRegistry::builtin()),
            Arc::new(UpstreamInvoker::new(repos, analyzer)),
            ServerInfo::new("gitbridge", "0.1.0"),
        );
        router(GatewayState::new(Arc::new(dispatcher), SessionTiming::default()))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_wants_event_stream() {
        let mut headers = HeaderMap::new();
        assert!(!wants_event_stream(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/event-stream"),
        );
        assert!(wants_event_stream(&headers));
    }

    #[tokio::test]
    async fn test_post_malformed_json_is_400() {
        let response = app(MockRepos::new())
            .oneshot(post_json("/mcp", "{\"jsonrpc\": "))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32700);
        assert_eq!(json["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_post_echoes_big_number_id() {
        let response = app(MockRepos::new())
            .oneshot(post_json(
                "/mcp",
                r#"{"jsonrpc":"2.0","id":18446744073709551616,"method":"ping"}"#,
            ))
            .await
            .unwrap();

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains(r#""id":18446744073709551616"#), "{}", text);
    }

    #[tokio::test]
    async fn test_post_invalid_request_is_200() {
        let response = app(MockRepos::new())
            .oneshot(post_json("/mcp", r#"{"jsonrpc":"2.0","id":9}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32600);
        assert_eq!(json["id"], 9);
    }

    #[tokio::test]
    async fn test_get_mcp_without_stream_returns_discovery() {
        let response = app(MockRepos::new())
            .oneshot(Request::builder().uri("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["functions"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_get_mcp_stream_headers() {
        let response = app(MockRepos::new())
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .header("accept", "text/event-stream")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/event-stream");
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");
    }

    #[tokio::test]
    async fn test_mcp_sse_redirects() {
        let response = app(MockRepos::new())
            .oneshot(Request::builder().uri("/mcp-sse").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/mcp");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(MockRepos::new())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-health-check"], "passed");
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["server"]["name"], "gitbridge");
        assert_eq!(json["endpoints"]["mcp"], "/mcp");

        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(json["system"]["memory"]["totalMb"].is_u64());
        assert!(json["system"]["memory"]["usagePercent"].as_u64().unwrap() <= 100);
        assert!(json["system"]["cpu"]["load"].as_array().unwrap().len() == 3);
        assert_eq!(json["server"]["pid"], std::process::id());
    }

    #[tokio::test]
    async fn test_analyze_repo_missing_params() {
        let response = app(MockRepos::new())
            .oneshot(post_json("/analyze-repo", r#"{"params":{"owner":"o"}}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["id"], "analyze_1");
        assert_eq!(json["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_analyze_repo_success() {
        let mut repos = MockRepos::new();
        repos
            .expect_get_repository()
            .returning(|_, _| Ok(sample_repo("react", 1000)));
        repos.expect_list_issues().returning(|_, _, _| {
            Ok(IssueList {
                count: 0,
                issues: vec![],
            })
        });

        let response = app(repos)
            .oneshot(post_json(
                "/analyze-repo",
                r#"{"id":42,"params":{"owner":"facebook","repo":"react"}}"#,
            ))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["id"], 42);
        assert_eq!(json["result"]["repository"], "facebook/react");
        assert_eq!(json["result"]["repositoryAnalysis"], "looks healthy");
        assert_eq!(json["result"]["issuesAnalysis"], "looks healthy");
    }

    #[tokio::test]
    async fn test_analyze_repo_failure_is_internal_error() {
        let mut repos = MockRepos::new();
        repos
            .expect_get_repository()
            .returning(|_, _| Err(gitbridge_core::Error::NotFound("Not Found".into())));

        let response = app(repos)
            .oneshot(post_json(
                "/analyze-repo",
                r#"{"params":{"owner":"o","repo":"missing"}}"#,
            ))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], -32603);
        assert_eq!(json["error"]["message"], "Not found: Not Found");
    }
}
