use std::sync::Arc;
use std::time::{Duration, Instant};

use stockroom::handlers::{ApiHandler, Handler, StaticFiles};
use stockroom::http::parser::parse_http_request;
use stockroom::http::request::Request;
use stockroom::http::response::StatusCode;
use stockroom::store::EntityStore;

fn parse(raw: &[u8]) -> Request {
    parse_http_request(raw).unwrap().0
}

fn body(method: &str, path: &str, body: &str) -> Request {
    let raw = format!(
        "{method} {path} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    parse(raw.as_bytes())
}

#[tokio::test]
async fn test_echo_returns_raw_request() {
    let raw = b"POST /echo/x HTTP/1.1\r\nHost: localhost\r\nContent-Length: 3\r\n\r\nabc";
    let response = Handler::Echo.handle(&parse(raw), "/x").await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.headers.get("Content-Type"), Some("text/plain"));
    assert_eq!(response.body, raw.to_vec());
}

#[tokio::test]
async fn test_health() {
    let response = Handler::Health.handle(&parse(b"GET /health HTTP/1.1\r\n\r\n"), "").await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"OK\r\n".to_vec());
}

#[tokio::test]
async fn test_sleep_waits_configured_duration() {
    let handler = Handler::Sleep(Duration::from_millis(50));
    let started = Instant::now();

    let response = handler.handle(&parse(b"GET /sleep HTTP/1.1\r\n\r\n"), "").await;

    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(response.body, b"The request slept for 50 ms\r\n".to_vec());
}

#[tokio::test]
async fn test_static_serves_files_with_mime_type() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("css")).unwrap();
    std::fs::write(dir.path().join("css/site.css"), "body {}").unwrap();
    std::fs::write(dir.path().join("blob"), [0u8, 1, 2]).unwrap();

    let handler = Handler::Static(StaticFiles::new(dir.path()));
    let req = parse(b"GET /static/css/site.css HTTP/1.1\r\n\r\n");

    let response = handler.handle(&req, "/css/site.css").await;
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.headers.get("Content-Type"), Some("text/css"));
    assert_eq!(response.body, b"body {}".to_vec());

    let response = handler.handle(&req, "/blob").await;
    assert_eq!(
        response.headers.get("Content-Type"),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn test_static_not_found_cases() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("www");
    std::fs::create_dir_all(root.join("sub")).unwrap();
    std::fs::write(dir.path().join("secret"), "nope").unwrap();

    let handler = Handler::Static(StaticFiles::new(&root));
    let req = parse(b"GET /static HTTP/1.1\r\n\r\n");

    for sub_path in ["", "/", "/missing.txt", "/sub", "/../secret"] {
        let response = handler.handle(&req, sub_path).await;
        assert_eq!(response.status, StatusCode::NotFound, "{sub_path:?}");
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_static_refuses_symlink_escape() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("www");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(dir.path().join("secret"), "nope").unwrap();
    std::os::unix::fs::symlink(dir.path().join("secret"), root.join("link")).unwrap();

    let handler = Handler::Static(StaticFiles::new(&root));
    let response = handler
        .handle(&parse(b"GET /static/link HTTP/1.1\r\n\r\n"), "/link")
        .await;

    assert_eq!(response.status, StatusCode::NotFound);
}

async fn api() -> (tempfile::TempDir, ApiHandler) {
    let dir = tempfile::tempdir().unwrap();
    let store = EntityStore::open(dir.path()).await.unwrap();
    (dir, ApiHandler::new(Arc::new(store)))
}

#[tokio::test]
async fn test_api_crud() {
    let (_dir, api) = api().await;

    let response = api.handle(&body("POST", "/api/Shoes", r#"{"size":42}"#), "/Shoes").await;
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, br#"{"id":1}"#.to_vec());
    assert_eq!(response.headers.get("Content-Type"), Some("application/json"));

    let response = api.handle(&body("GET", "/api/Shoes/1", ""), "/Shoes/1").await;
    assert_eq!(response.body, br#"{"size":42}"#.to_vec());

    let response = api.handle(&body("PUT", "/api/Shoes/1", r#"{"size":43}"#), "/Shoes/1").await;
    assert_eq!(response.body, br#"{"status":"success"}"#.to_vec());

    let response = api.handle(&body("GET", "/api/Shoes", ""), "/Shoes").await;
    assert_eq!(response.body, b"[1]".to_vec());

    let response = api.handle(&body("DELETE", "/api/Shoes/1", ""), "/Shoes/1").await;
    assert_eq!(response.status, StatusCode::Ok);

    let response = api.handle(&body("GET", "/api/Shoes/1", ""), "/Shoes/1").await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_api_head_reads_like_get() {
    let (_dir, api) = api().await;
    api.handle(&body("POST", "/api/Shoes", "{}"), "/Shoes").await;

    let response = api.handle(&body("HEAD", "/api/Shoes", ""), "/Shoes").await;
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"[1]".to_vec());

    let response = api.handle(&body("HEAD", "/api/Shoes/1", ""), "/Shoes/1").await;
    assert_eq!(response.status, StatusCode::Ok);

    let response = api.handle(&body("HEAD", "/api/Shoes/2", ""), "/Shoes/2").await;
    assert_eq!(response.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_api_rejects_invalid_json() {
    let (_dir, api) = api().await;

    let response = api.handle(&body("POST", "/api/Shoes", "{not json"), "/Shoes").await;
    assert_eq!(response.status, StatusCode::BadRequest);

    let response = api.handle(&body("GET", "/api/Shoes", ""), "/Shoes").await;
    assert_eq!(response.body, b"[]".to_vec());
}

#[tokio::test]
async fn test_api_status_codes() {
    let (_dir, api) = api().await;

    let cases = [
        ("PUT", "/Shoes/9", "{}", StatusCode::NotFound),
        ("DELETE", "/Shoes/9", "", StatusCode::NotFound),
        ("GET", "/Shoes/abc", "", StatusCode::BadRequest),
        ("GET", "", "", StatusCode::BadRequest),
        ("PUT", "/Shoes", "{}", StatusCode::MethodNotAllowed),
        ("POST", "/Shoes/1", "{}", StatusCode::MethodNotAllowed),
        ("PATCH", "/Shoes/1", "{}", StatusCode::MethodNotAllowed),
    ];

    for (method, sub_path, payload, expected) in cases {
        let req = body(method, &format!("/api{sub_path}"), payload);
        let response = api.handle(&req, sub_path).await;
        assert_eq!(response.status, expected, "{method} {sub_path}");
    }
}

#[tokio::test]
async fn test_api_concurrent_posts_get_distinct_ids() {
    let (_dir, api) = api().await;
    let api = Arc::new(api);
    let started = Instant::now();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let api = Arc::clone(&api);
            tokio::spawn(async move {
                let req = body("POST", "/api/Shoes", "{}");
                api.handle(&req, "/Shoes").await.body
            })
        })
        .collect();

    let mut bodies = Vec::new();
    for task in tasks {
        bodies.push(String::from_utf8(task.await.unwrap()).unwrap());
    }
    bodies.sort();
    bodies.dedup();

    assert_eq!(bodies.len(), 16);
    assert!(started.elapsed() < Duration::from_secs(10));
}
