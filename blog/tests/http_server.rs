#![cfg(feature = "http-server")]
//! Integration tests for the blog HTTP server.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use blog::Blog;
use blog::seed::seed;
use blog::server::handlers::AppState;
use blog::server::metrics::Metrics;
use blog::server::router;
use common::storage::in_memory::InMemoryStorage;
use eventlog::{BroadcastConfig, Broadcaster, LogRead, TailConfig};
use futures::StreamExt;
use serde_json::Value;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    blog: Arc<Blog>,
    broadcaster: Arc<Broadcaster>,
}

async fn setup_test_app() -> TestApp {
    let blog = Blog::open(Arc::new(InMemoryStorage::new()), TailConfig::default())
        .await
        .expect("Failed to open blog");
    seed(&blog).await.expect("Failed to seed blog");
    let broadcaster = Broadcaster::start(blog.events(), BroadcastConfig::default())
        .expect("Failed to start broadcaster");

    let blog = Arc::new(blog);
    let broadcaster = Arc::new(broadcaster);
    let state = AppState {
        blog: blog.clone(),
        broadcaster: broadcaster.clone(),
        metrics: Arc::new(Metrics::new()),
        sse_keep_alive: Duration::from_secs(15),
    };

    TestApp {
        app: router(state),
        blog,
        broadcaster,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn post_article(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/article/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn should_list_seeded_articles_newest_first() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, json) = get_json(&test.app, "/api/article/").await;

    // then
    assert_eq!(status, StatusCode::OK);
    let articles = json.as_array().unwrap();
    assert_eq!(articles.len(), 3);
    assert_eq!(articles[0]["slug"], "reactor-bismuth-is-out");
    assert_eq!(articles[0]["addedAt"], "2017-09-28T12:00:00");
}

#[tokio::test]
async fn should_find_one_article() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, json) = get_json(&test.app, "/api/article/reactor-bismuth-is-out").await;

    // then
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Reactor Bismuth is out");
    assert_eq!(json["author"], "simonbasle");
    assert!(json["headline"].as_str().unwrap().contains("**Reactor Bismuth**"));
}

#[tokio::test]
async fn should_render_markdown_when_converter_requested() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, json) = get_json(
        &test.app,
        "/api/article/reactor-bismuth-is-out?converter=markdown",
    )
    .await;

    // then
    assert_eq!(status, StatusCode::OK);
    let headline = json["headline"].as_str().unwrap();
    assert!(headline.contains("<strong>Reactor Bismuth</strong>"));
    let content = json["content"].as_str().unwrap();
    assert!(content.contains("<a href=\"https://spring.io/blog/2017/09/28/spring-framework-5-0-goes-ga\">"));
}

#[tokio::test]
async fn should_reject_unsupported_converter() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, json) = get_json(&test.app, "/api/article/reactor-bismuth-is-out?converter=foo").await;

    // then
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Only markdown converter is supported");
}

#[tokio::test]
async fn should_return_404_for_unknown_slug() {
    // given
    let test = setup_test_app().await;

    // when
    let (article_status, _) = get(&test.app, "/api/article/nope").await;
    let (post_status, _) = get(&test.app, "/api/post/nope").await;
    let (user_status, _) = get(&test.app, "/api/user/nope").await;

    // then
    assert_eq!(article_status, StatusCode::NOT_FOUND);
    assert_eq!(post_status, StatusCode::NOT_FOUND);
    assert_eq!(user_status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_save_article_and_publish_event() {
    // given
    let test = setup_test_app().await;
    let body = r#"{"slug":"foo","title":"Foo","headline":"foo","content":"foo","author":"sdeleuze","addedAt":"2020-01-01T10:00:00"}"#;

    // when
    let (status, saved) = send(&test.app, post_article(body)).await;

    // then
    assert_eq!(status, StatusCode::OK);
    let saved: Value = serde_json::from_slice(&saved).unwrap();
    assert_eq!(saved["slug"], "foo");
    let (status, json) = get_json(&test.app, "/api/article/foo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Foo");
    assert_eq!(test.blog.events().count().await.unwrap(), 1);
}

#[tokio::test]
async fn should_derive_slug_from_title() {
    // given
    let test = setup_test_app().await;
    let body = r#"{"title":"Hello Rust World","author":"smaldini"}"#;

    // when
    let (status, _) = send(&test.app, post_article(body)).await;

    // then
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&test.app, "/api/article/hello-rust-world").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn should_reject_invalid_article_body() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, body) = send(&test.app, post_article(r#"{"title":"No author"}"#)).await;

    // then
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(test.blog.events().count().await.unwrap(), 0);
}

#[tokio::test]
async fn should_delete_article_without_event() {
    // given
    let test = setup_test_app().await;
    let request = Request::builder()
        .method("DELETE")
        .uri("/api/article/reactor-bismuth-is-out")
        .body(Body::empty())
        .unwrap();

    // when
    let (status, _) = send(&test.app, request).await;

    // then
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get(&test.app, "/api/article/reactor-bismuth-is-out").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, json) = get_json(&test.app, "/api/article/").await;
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(test.blog.events().count().await.unwrap(), 0);
}

#[tokio::test]
async fn should_resolve_post_author() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, json) = get_json(&test.app, "/api/post/reactor-bismuth-is-out").await;

    // then
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["author"]["login"], "simonbasle");
    assert_eq!(json["author"]["firstname"], "Simon");
}

#[tokio::test]
async fn should_list_posts_with_converter() {
    // given
    let test = setup_test_app().await;

    // when
    let (status, json) = get_json(&test.app, "/api/post/").await;
    let (converted_status, converted) = get_json(
        &test.app,
        "/api/post/spring-framework-5-0-goes-ga?converter=markdown",
    )
    .await;

    // then
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(converted_status, StatusCode::OK);
    assert!(converted["headline"].as_str().unwrap().contains("<a href=\"https://repo.spring.io\">"));
}

#[tokio::test]
async fn should_list_and_find_users() {
    // given
    let test = setup_test_app().await;

    // when
    let (list_status, list) = get_json(&test.app, "/api/user/").await;
    let (one_status, one) = get_json(&test.app, "/api/user/violetagg").await;

    // then
    assert_eq!(list_status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 11);
    assert_eq!(one_status, StatusCode::OK);
    assert_eq!(one["lastname"], "Georgieva");
}

#[tokio::test]
async fn should_serve_health_and_metrics() {
    // given
    let test = setup_test_app().await;
    get(&test.app, "/api/article/").await;

    // when
    let (healthy, _) = get(&test.app, "/-/healthy").await;
    let (ready, _) = get(&test.app, "/-/ready").await;
    let (metrics_status, metrics) = get(&test.app, "/metrics").await;

    // then
    assert_eq!(healthy, StatusCode::OK);
    assert_eq!(ready, StatusCode::OK);
    assert_eq!(metrics_status, StatusCode::OK);
    let metrics = String::from_utf8(metrics).unwrap();
    assert!(metrics.contains("http_requests_total"));
    assert!(metrics.contains("endpoint=\"/api/article/\""));
}

#[tokio::test]
async fn should_report_not_ready_after_close() {
    // given
    let test = setup_test_app().await;

    // when
    test.blog.close().await.unwrap();

    // then
    let (status, _) = get(&test.app, "/-/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_stream_saved_articles_as_notifications() {
    // given
    let test = setup_test_app().await;
    let request = Request::builder()
        .uri("/api/article/notifications")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(test.broadcaster.subscriber_count(), 1);
    let mut stream = response.into_body().into_data_stream();

    // when
    let body = r#"{"slug":"foo","title":"Foo","author":"sdeleuze"}"#;
    let (status, _) = send(&test.app, post_article(body)).await;
    assert_eq!(status, StatusCode::OK);

    // then
    let mut received = String::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !received.contains("\n\n") {
            let chunk = stream.next().await.unwrap().unwrap();
            received.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    })
    .await
    .unwrap();
    assert!(received.contains("event: article"));
    assert!(received.contains("id: 0"));
    assert!(received.contains(r#""slug":"foo""#));
    assert!(received.contains(r#""title":"Foo""#));

    drop(stream);
    assert_eq!(test.broadcaster.subscriber_count(), 0);
}

#[tokio::test]
async fn should_not_replay_articles_saved_before_connecting() {
    // given
    let test = setup_test_app().await;
    let before = r#"{"slug":"before","title":"Before","author":"sdeleuze"}"#;
    send(&test.app, post_article(before)).await;
    let request = Request::builder()
        .uri("/api/article/notifications")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();
    let mut stream = response.into_body().into_data_stream();

    // when
    let after = r#"{"slug":"after","title":"After","author":"sdeleuze"}"#;
    send(&test.app, post_article(after)).await;

    // then
    let mut received = String::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !received.contains("\n\n") {
            let chunk = stream.next().await.unwrap().unwrap();
            received.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    })
    .await
    .unwrap();
    assert!(received.contains(r#""slug":"after""#));
    assert!(!received.contains(r#""slug":"before""#));
}

#[tokio::test]
async fn should_end_notification_stream_on_shutdown() {
    // given
    let test = setup_test_app().await;
    let request = Request::builder()
        .uri("/api/article/notifications")
        .body(Body::empty())
        .unwrap();
    let response = test.app.clone().oneshot(request).await.unwrap();
    let mut stream = response.into_body().into_data_stream();

    // when
    test.broadcaster.shutdown().await;

    // then
    let next = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .unwrap();
    assert!(next.is_none());
}

#[tokio::test]
async fn should_label_unsupported_methods_as_other() {
    // given
    let test = setup_test_app().await;
    let request = Request::builder()
        .method("PUT")
        .uri("/api/article/")
        .body(Body::empty())
        .unwrap();

    // when
    let (status, _) = send(&test.app, request).await;

    // then
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    let (_, metrics) = get(&test.app, "/metrics").await;
    let metrics = String::from_utf8(metrics).unwrap();
    assert!(metrics.contains("method=\"Other\""));
}
