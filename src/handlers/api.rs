//! CRUD over the entity store
//!
//! Paths below the route prefix take two shapes:
//!
//! | Method | Path | Store call |
//! |---|---|---|
//! | POST | `/{collection}` | create, returns `{"id":N}` |
//! | GET, HEAD | `/{collection}` | list, returns `[ids...]` |
//! | GET, HEAD | `/{collection}/{id}` | get, returns the stored body |
//! | PUT | `/{collection}/{id}` | update |
//! | DELETE | `/{collection}/{id}` | delete |

use std::sync::Arc;

use serde::de::IgnoredAny;
use serde_json::json;
use tracing::error;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::store::entity::validate_collection_name;
use crate::store::{EntityStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target<'a> {
    Collection(&'a str),
    Record(&'a str, u64),
}

#[derive(Debug, Clone)]
pub struct ApiHandler {
    store: Arc<EntityStore>,
}

impl ApiHandler {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, req: &Request, sub_path: &str) -> Response {
        let target = match parse_target(sub_path) {
            Ok(target) => target,
            Err(response) => return response,
        };

        match (req.method, target) {
            (Method::POST, Target::Collection(collection)) => {
                self.create(collection, &req.body).await
            }
            (Method::GET | Method::HEAD, Target::Collection(collection)) => {
                self.list(collection).await
            }
            (Method::GET | Method::HEAD, Target::Record(collection, id)) => {
                self.get(collection, id).await
            }
            (Method::PUT, Target::Record(collection, id)) => {
                self.update(collection, id, &req.body).await
            }
            (Method::DELETE, Target::Record(collection, id)) => {
                self.delete(collection, id).await
            }
            _ => Response::method_not_allowed(),
        }
    }

    async fn create(&self, collection: &str, body: &[u8]) -> Response {
        if !is_json(body) {
            return Response::bad_request("Invalid JSON data");
        }

        match self.store.create(collection, body).await {
            Ok(id) => Response::json(StatusCode::Ok, json!({ "id": id }).to_string()),
            Err(e) => store_error_response(e, collection, None),
        }
    }

    async fn list(&self, collection: &str) -> Response {
        match self.store.list(collection).await {
            Ok(ids) => Response::json(StatusCode::Ok, json!(ids).to_string()),
            Err(e) => store_error_response(e, collection, None),
        }
    }

    async fn get(&self, collection: &str, id: u64) -> Response {
        match self.store.get(collection, id).await {
            Ok(body) => Response::json(StatusCode::Ok, body),
            Err(e) => store_error_response(e, collection, Some(id)),
        }
    }

    async fn update(&self, collection: &str, id: u64, body: &[u8]) -> Response {
        if !is_json(body) {
            return Response::bad_request("Invalid JSON data");
        }

        match self.store.update(collection, id, body).await {
            Ok(()) => success(),
            Err(e) => store_error_response(e, collection, Some(id)),
        }
    }

    async fn delete(&self, collection: &str, id: u64) -> Response {
        match self.store.delete(collection, id).await {
            Ok(()) => success(),
            Err(e) => store_error_response(e, collection, Some(id)),
        }
    }
}

fn parse_target(sub_path: &str) -> Result<Target<'_>, Response> {
    let rest = sub_path.strip_prefix('/').unwrap_or(sub_path);
    let mut segments = rest.split('/');

    let collection = segments.next().unwrap_or_default();
    if validate_collection_name(collection).is_err() {
        return Err(Response::bad_request("Invalid API request URI"));
    }

    match (segments.next(), segments.next()) {
        (None, _) => Ok(Target::Collection(collection)),
        (Some(id), None) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => id
            .parse()
            .map(|id| Target::Record(collection, id))
            .map_err(|_| Response::bad_request("Invalid entity id")),
        (Some(_), None) => Err(Response::bad_request("Invalid entity id")),
        _ => Err(Response::bad_request("Invalid API request URI")),
    }
}

fn is_json(body: &[u8]) -> bool {
    serde_json::from_slice::<IgnoredAny>(body).is_ok()
}

fn success() -> Response {
    Response::json(StatusCode::Ok, json!({ "status": "success" }).to_string())
}

fn store_error_response(err: StoreError, collection: &str, id: Option<u64>) -> Response {
    match err {
        StoreError::NotFound => Response::not_found(),
        StoreError::InvalidCollection(_) => Response::bad_request("Invalid API request URI"),
        StoreError::Io(e) => {
            error!(collection, ?id, error = %e, "Entity store I/O failure");
            Response::internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets() {
        assert_eq!(parse_target("/Shoes").unwrap(), Target::Collection("Shoes"));
        assert_eq!(parse_target("/Shoes/12").unwrap(), Target::Record("Shoes", 12));
    }

    #[test]
    fn bad_targets() {
        for path in ["", "/", "/Shoes/abc", "/Shoes/-1", "/Shoes/1/extra", "/Sh.oes", "/Shoes/"] {
            let response = parse_target(path).unwrap_err();
            assert_eq!(response.status, StatusCode::BadRequest, "{path}");
        }
    }

    #[test]
    fn json_detection() {
        assert!(is_json(br#"{"brand":"Nike","size":42}"#));
        assert!(is_json(b"[1, 2]"));
        assert!(!is_json(b""));
        assert!(!is_json(b"{\"brand\":"));
    }
}
