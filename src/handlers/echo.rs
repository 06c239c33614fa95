use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Answers with the request exactly as it was received, whatever the method.
pub fn handle(req: &Request) -> Response {
    ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .body(req.raw.clone())
        .build()
}
