use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/api/feed", get(handlers::feed))
        .route("/api/search", get(handlers::search))
        .route("/api/posts/:id", get(handlers::get_post))
        .route("/api/posts/:id/like", post(handlers::toggle_like))
        .route("/api/posts/:id/comments", post(handlers::add_comment))
        .route("/api/bookmarks", get(handlers::list_bookmarks))
        .route("/api/bookmarks/:id", put(handlers::save_bookmark).delete(handlers::remove_bookmark))
        .route("/api/session", get(handlers::get_session))
        .route("/api/session/signin", post(handlers::sign_in))
        .route("/api/session/signup", post(handlers::sign_up))
        .route("/api/session/guest", post(handlers::guest))
        .route("/api/session/signout", post(handlers::sign_out))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use crate::{create_app, ApiError, AppState};
    pub use nr_core::{Article, Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use nr_core::ReaderConfig;
    use nr_reader::Reader;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn app() -> Router {
        app_with_latency(Duration::ZERO).await
    }

    async fn app_with_latency(mock_latency: Duration) -> Router {
        let config = ReaderConfig { mock_latency, ..Default::default() };
        let reader = Reader::new(config).await.unwrap();
        create_app(AppState { reader }).await
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    #[tokio::test]
    async fn test_feed_and_search() {
        let app = app().await;
        let (status, body) = call(&app, Method::GET, "/api/feed?category=Technology", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[0]["id"], "mock-tech-1");

        let (status, body) = call(&app, Method::GET, "/api/search?q=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = call(&app, Method::GET, "/api/search?q=ai&sort=sideways", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_interactions_need_a_session() {
        let app = app().await;
        let (status, _) = call(&app, Method::POST, "/api/posts/mock-1/like", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&app, Method::POST, "/api/session/guest", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "authenticated");
        assert_eq!(body["session"]["isAnonymous"], true);

        let (status, body) = call(&app, Method::POST, "/api/posts/mock-1/like", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "liked": true, "likesCount": 1 }));

        let (status, _) = call(&app, Method::POST, "/api/posts/mock-1/comments", Some(json!({ "text": " " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) =
            call(&app, Method::POST, "/api/posts/mock-1/comments", Some(json!({ "text": "hi" }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["comment"], "hi");

        let (status, body) = call(&app, Method::GET, "/api/posts/mock-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["like"]["liked"], true);
        assert_eq!(body["interaction"]["comments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bookmarks() {
        let app = app().await;
        call(&app, Method::POST, "/api/session/guest", None).await;

        let (status, _) = call(&app, Method::PUT, "/api/bookmarks/mock-2", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, Method::GET, "/api/bookmarks", None).await;
        assert_eq!(body[0]["article"]["id"], "mock-2");

        let (status, _) = call(&app, Method::DELETE, "/api/bookmarks/mock-2", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, body) = call(&app, Method::GET, "/api/bookmarks", None).await;
        assert!(body.as_array().unwrap().is_empty());

        let (status, _) = call(&app, Method::PUT, "/api/bookmarks/unknown", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_session_flow() {
        let app = app().await;
        let creds = json!({ "name": "Ana", "email": "ana@example.com", "password": "secret1" });
        let (status, body) = call(&app, Method::POST, "/api/session/signup", Some(creds)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["displayName"], "Ana");

        let (_, body) = call(&app, Method::POST, "/api/session/signout", None).await;
        assert_eq!(body["state"], "signedOut");

        let wrong = json!({ "email": "ana@example.com", "password": "nope123" });
        let (status, _) = call(&app, Method::POST, "/api/session/signin", Some(wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_overlapping_post_requests_both_succeed() {
        let app = app_with_latency(Duration::from_millis(200)).await;
        let first = call(&app, Method::GET, "/api/posts/mock-1", None);
        let second = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            call(&app, Method::GET, "/api/posts/mock-1", None).await
        };
        let ((first_status, first_body), (second_status, second_body)) = tokio::join!(first, second);
        assert_eq!(first_status, StatusCode::OK);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first_body["article"]["id"], "mock-1");
        assert_eq!(second_body["article"]["id"], "mock-1");
    }
}
