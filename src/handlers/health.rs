use crate::http::response::Response;

pub const HEALTH_BODY: &str = "OK\r\n";

pub fn handle() -> Response {
    Response::ok(HEALTH_BODY)
}
