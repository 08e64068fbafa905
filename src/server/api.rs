use axum::{
    extract::{ rejection::JsonRejection, State },
    http::StatusCode,
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use log::{ error, warn };
use serde::Serialize;
use tower_http::cors::{ Any, CorsLayer };
use tower_http::services::{ ServeDir, ServeFile };

use crate::context::AppContext;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::models::chat::{ ErrorResponse, MessageRequest, ReplyResponse, SubmitRequest };

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    mode: String,
    model: String,
}

pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_dir = ctx.config.static_dir.clone();
    let index = static_dir.join(ctx.config.mode.index_page());

    let router = match &ctx.gateway {
        Gateway::Retrying(_) => Router::new().route("/api/submit", post(submit_handler)),
        Gateway::Cached(_) => Router::new().route("/get_response", post(get_response_handler)),
    };

    router
        .route("/health", get(health_handler))
        .route_service("/", ServeFile::new(index))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .with_state(ctx)
}

fn error_response(err: &GatewayError) -> Response {
    let (status, label) = if err.is_client_error() {
        (StatusCode::BAD_REQUEST, "Invalid request")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };
    (status, Json(ErrorResponse { error: label.into(), detail: err.to_string() })).into_response()
}

fn reject(rejection: JsonRejection) -> Response {
    warn!("Rejected request body: {}", rejection.body_text());
    error_response(&GatewayError::InvalidRequest(rejection.body_text()))
}

async fn health_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        mode: ctx.config.mode.to_string(),
        model: ctx.config.model().to_string(),
    })
}

async fn submit_handler(
    State(ctx): State<AppContext>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return reject(rejection),
    };
    let Gateway::Retrying(gateway) = &ctx.gateway else {
        return error_response(&GatewayError::Internal("retry gateway not configured".into()));
    };

    match gateway.reply(&req.history).await {
        Ok(response) => Json(ReplyResponse { response }).into_response(),
        Err(e) => {
            error!("Error in /api/submit: {}", e);
            error_response(&e)
        }
    }
}

async fn get_response_handler(
    State(ctx): State<AppContext>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rejection) => return reject(rejection),
    };
    let Gateway::Cached(gateway) = &ctx.gateway else {
        return error_response(&GatewayError::Internal("cached gateway not configured".into()));
    };

    match gateway.reply(&req.message).await {
        Ok(response) => Json(ReplyResponse { response }).into_response(),
        Err(e) => {
            error!("Error in /get_response: {}", e);
            error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ CacheKeyPolicy, SqliteResponseCache };
    use crate::cli::Args;
    use crate::config::GatewayConfig;
    use crate::gateway::{ CachedGateway, RetryingGateway };
    use crate::retry::tests::{ RecordingSleeper, ScriptedClient };
    use crate::retry::RetryPolicy;
    use axum::body::{ to_bytes, Body };
    use axum::http::Request;
    use clap::Parser;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn config(mode: &str, static_dir: &str) -> GatewayConfig {
        let args = Args::try_parse_from([
            "gateway",
            "--mode",
            mode,
            "--host",
            "127.0.0.1",
            "--static-dir",
            static_dir,
        ]).unwrap();
        GatewayConfig::resolve(&args, |name: &str| {
            (name == "GENAI_API_KEY").then(|| "test-key".to_string())
        }).unwrap()
    }

    fn retry_app(client: Arc<ScriptedClient>, static_dir: &str) -> Router {
        let gateway = RetryingGateway::new(
            client,
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default())
        );
        create_router(AppContext::new(config("retry", static_dir), Gateway::Retrying(gateway)))
    }

    async fn cached_app(client: Arc<ScriptedClient>) -> Router {
        let cache = Arc::new(SqliteResponseCache::open_in_memory().await.unwrap());
        let gateway = CachedGateway::new(client, cache, CacheKeyPolicy::Exact);
        create_router(AppContext::new(config("cached", "static"), Gateway::Cached(gateway)))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn submit_returns_model_reply() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("hello back")]));
        let app = retry_app(client.clone(), "static");

        let resp = app
            .oneshot(post_json("/api/submit", r#"{"history":[{"role":"user","content":"hi"}]}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["response"], "hello back");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn submit_maps_credential_failure_to_500() {
        let client = Arc::new(ScriptedClient::new(vec![Err("403 API key was reported as leaked")]));
        let app = retry_app(client.clone(), "static");

        let resp = app.oneshot(post_json("/api/submit", r#"{"history":[]}"#)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "Internal server error");
        assert!(body["detail"].as_str().unwrap().contains("leaked"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn submit_error_detail_omits_api_key() {
        let client = crate::llm::chat::gemini::GeminiChatClient::new(
            "SECRETKEY123".into(),
            Some("m".into()),
            Some("http://127.0.0.1:1".into())
        ).unwrap();
        let gateway = RetryingGateway::new(
            Arc::new(client),
            RetryPolicy::default(),
            Arc::new(RecordingSleeper::default())
        );
        let app = create_router(
            AppContext::new(config("retry", "static"), Gateway::Retrying(gateway))
        );

        let resp = app.oneshot(post_json("/api/submit", r#"{"history":[]}"#)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body_json(resp).await["detail"].as_str().unwrap().to_string();
        assert!(!detail.contains("SECRETKEY123"), "{}", detail);
    }

    #[tokio::test]
    async fn submit_accepts_turn_without_role() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("ok")]));
        let app = retry_app(client.clone(), "static");

        let resp = app
            .oneshot(post_json("/api/submit", r#"{"history":[{"content":"x"}]}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn submit_rejects_malformed_body() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("unused")]));
        let app = retry_app(client.clone(), "static");

        let resp = app.oneshot(post_json("/api/submit", "{not json")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "Invalid request");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn get_response_caches_answers() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("A1")]));
        let app = cached_app(client.clone()).await;

        for _ in 0..2 {
            let resp = app
                .clone()
                .oneshot(post_json("/get_response", r#"{"message":"Q1"}"#))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(body_json(resp).await["response"], "A1");
        }
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn get_response_upstream_failure_is_json_500() {
        let client = Arc::new(ScriptedClient::new(vec![Err("connection reset")]));
        let app = cached_app(client).await;

        let resp = app.oneshot(post_json("/get_response", r#"{"message":"Q1"}"#)).await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_json(resp).await["detail"].as_str().unwrap().contains("connection reset"));
    }

    #[tokio::test]
    async fn only_the_configured_route_is_mounted() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("A1")]));
        let app = cached_app(client).await;

        let resp = app.oneshot(post_json("/api/submit", r#"{"history":[]}"#)).await.unwrap();
        assert_ne!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn serves_index_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>chat</h1>").unwrap();
        let client = Arc::new(ScriptedClient::new(vec![Ok("unused")]));
        let app = retry_app(client, dir.path().to_str().unwrap());

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<h1>chat</h1>");
    }

    #[tokio::test]
    async fn health_reports_mode_and_model() {
        let client = Arc::new(ScriptedClient::new(vec![Ok("unused")]));
        let app = retry_app(client, "static");

        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mode"], "retry");
        assert_eq!(body["model"], "gemini-2.5-flash");
    }
}
