use std::sync::Arc;

use stockroom::config::{Config, MatchMode};
use stockroom::handlers::Handler;
use stockroom::router::{Route, Router};
use stockroom::store::EntityStore;

#[test]
fn test_router_prefers_exact_over_prefix() {
    let router = Router::new(vec![
        Route::new("/", MatchMode::Prefix, Handler::Echo),
        Route::new("/health", MatchMode::Exact, Handler::Health),
    ]);

    assert_eq!(router.resolve("/health").unwrap().route.handler().name(), "health");
    assert_eq!(router.resolve("/health/x").unwrap().route.handler().name(), "echo");
}

#[test]
fn test_router_root_prefix_matches_everything() {
    let router = Router::new(vec![Route::new("/", MatchMode::Prefix, Handler::Echo)]);

    let m = router.resolve("/anything/here").unwrap();
    assert_eq!(m.sub_path, "/anything/here");
    assert_eq!(router.resolve("/").unwrap().sub_path, "/");
}

#[test]
fn test_router_normalizes_route_paths() {
    let router = Router::new(vec![Route::new("/echo/", MatchMode::Prefix, Handler::Echo)]);

    assert_eq!(router.routes()[0].path(), "/echo");
    assert!(router.resolve("/echo").is_some());
}

#[test]
fn test_router_no_match() {
    let router = Router::new(vec![Route::new("/echo", MatchMode::Prefix, Handler::Echo)]);

    assert!(router.resolve("/").is_none());
    assert!(router.resolve("/echoes").is_none());
    assert!(Router::default().resolve("/echo").is_none());
}

#[tokio::test]
async fn test_router_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(EntityStore::open(dir.path()).await.unwrap());
    let cfg = Config::from_yaml(
        r#"
port: 0
routes:
  - path: /echo
    handler: echo
  - path: /static
    handler: static
    root: ./public
  - path: /health
    handler: health
  - path: /sleep
    handler: sleep
  - path: /api
    handler: api
"#,
    )
    .unwrap();

    let router = Router::from_config(&cfg, store);
    let names: Vec<_> = router.routes().iter().map(|r| r.handler().name()).collect();
    assert_eq!(names, ["echo", "static", "health", "sleep", "api"]);

    let m = router.resolve("/api/Shoes/1").unwrap();
    assert_eq!(m.route.handler().name(), "api");
    assert_eq!(m.sub_path, "/Shoes/1");

    assert!(router.resolve("/sleep/more").is_none());
}
