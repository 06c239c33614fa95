use stockroom::http::response::{MALFORMED_REQUEST_BODY, Response, ResponseBuilder, StatusCode};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::MethodNotAllowed.reason_phrase(),
        "Method Not Allowed"
    );
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_response_builder_defaults() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .body(b"Hello, World!".to_vec())
        .build();

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"Hello, World!".to_vec());

    let headers: Vec<_> = response.headers.iter().collect();
    assert_eq!(
        headers,
        [("Content-Length", "13"), ("Content-Type", "text/plain")]
    );
}

#[test]
fn test_response_builder_with_headers() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "application/json")
        .header("X-Custom", "value")
        .body(b"{}".to_vec())
        .build();

    assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
    assert_eq!(response.headers.get("X-Custom"), Some("value"));
    assert_eq!(response.headers.len(), 3); // 2 custom + Content-Length
}

#[test]
fn test_response_builder_header_replaces() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("X-Custom", "one")
        .header("x-custom", "two")
        .build();

    assert_eq!(response.headers.get("X-Custom"), Some("two"));
    assert_eq!(response.headers.len(), 3);
}

#[test]
fn test_response_builder_preserves_custom_content_length() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", "999")
        .body(b"test".to_vec())
        .build();

    assert_eq!(response.headers.get("Content-Length"), Some("999"));
}

#[test]
fn test_response_builder_empty_body() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert!(response.body.is_empty());
    assert_eq!(response.headers.get("Content-Length"), Some("0"));
}

#[test]
fn test_response_helpers() {
    let response = Response::ok("test content");
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"test content".to_vec());

    let response = Response::not_found();
    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, b"404 Not Found".to_vec());

    let response = Response::internal_error();
    assert_eq!(response.status, StatusCode::InternalServerError);

    let response = Response::json(StatusCode::Ok, r#"{"id":1}"#);
    assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
}

#[test]
fn test_malformed_request_response() {
    let response = Response::malformed_request();

    assert_eq!(response.status_line(), "HTTP/1.1 400 Bad Request");
    assert_eq!(response.body, MALFORMED_REQUEST_BODY.as_bytes());
    assert_eq!(response.headers.get("Content-Length"), Some("46"));
}
