use axum::Router;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{chat_handler, health_handler, index_handler, script_handler};
use super::server::AppState;

pub(crate) fn build_router(state: AppState, max_body_size: usize) -> Router {
    let chat = Router::new()
        .route("/chat", post(chat_handler))
        .layer(RequestBodyLimitLayer::new(max_body_size));

    Router::new()
        .route("/", get(index_handler))
        .route("/static/script.js", get(script_handler))
        .route("/health", get(health_handler))
        .merge(chat)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use reporag_core::AnswerService;
    use reporag_core::pipeline::BoxFuture;
    use tower::ServiceExt;

    use super::*;

    #[derive(Default)]
    struct RecordingService {
        calls: AtomicUsize,
        namespaces: Mutex<Vec<Option<String>>>,
    }

    impl AnswerService for RecordingService {
        fn answer<'a>(
            &'a self,
            query: &'a str,
            namespace: Option<&'a str>,
        ) -> BoxFuture<'a, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.namespaces
                .lock()
                .unwrap()
                .push(namespace.map(str::to_owned));
            Box::pin(async move { format!("answer to {query}") })
        }
    }

    fn make_router(max_body_size: usize) -> (Router, Arc<RecordingService>) {
        let service = Arc::new(RecordingService::default());
        let state = AppState {
            service: service.clone(),
            started_at: Instant::now(),
        };
        (build_router(state, max_body_size), service)
    }

    fn chat_request(body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let (app, _) = make_router(1_048_576);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["status"], "ok");
        assert!(json["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn chat_returns_service_answer() {
        let (app, service) = make_router(1_048_576);
        let resp = app
            .oneshot(chat_request(&serde_json::json!({"query": "what is main?"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let json = json_body(resp).await;
        assert_eq!(json["response"], "answer to what is main?");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*service.namespaces.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_calling_service() {
        for body in [
            serde_json::json!({"query": ""}),
            serde_json::json!({"query": "   "}),
            serde_json::json!({"query": null}),
            serde_json::json!({}),
        ] {
            let (app, service) = make_router(1_048_576);
            let resp = app.oneshot(chat_request(&body)).await.unwrap();
            assert_eq!(resp.status(), 200);
            let json = json_body(resp).await;
            assert_eq!(json["response"], "Please provide a valid question.");
            assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn codebase_selects_namespace() {
        let (app, service) = make_router(1_048_576);
        let resp = app
            .oneshot(chat_request(
                &serde_json::json!({"query": "q", "codebase": " flask "}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            *service.namespaces.lock().unwrap(),
            vec![Some("flask".to_owned())]
        );
    }

    #[tokio::test]
    async fn blank_codebase_uses_default_namespace() {
        let (app, service) = make_router(1_048_576);
        app.oneshot(chat_request(&serde_json::json!({"query": "q", "codebase": ""})))
            .await
            .unwrap();
        assert_eq!(*service.namespaces.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn malformed_json_is_client_error() {
        let (app, service) = make_router(1_048_576);
        let req = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn index_serves_chat_page() {
        let (app, _) = make_router(1_048_576);
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        let content_type = resp.headers()["content-type"].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/html"));
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("<textarea"));
    }

    #[tokio::test]
    async fn script_is_served_as_javascript() {
        let (app, _) = make_router(1_048_576);
        let req = Request::builder()
            .uri("/static/script.js")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["content-type"],
            "text/javascript; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn body_size_limit() {
        let (app, _) = make_router(64);
        let oversized = serde_json::json!({"query": "a".repeat(128)});
        let resp = app.oneshot(chat_request(&oversized)).await.unwrap();
        assert_eq!(resp.status(), 413);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (app, _) = make_router(1_048_576);
        let req = Request::builder()
            .uri("/missing")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }
}
