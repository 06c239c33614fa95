use std::time::Duration;

use crate::http::response::Response;

/// Suspends only the calling connection's task for `duration`.
pub async fn handle(duration: Duration) -> Response {
    tokio::time::sleep(duration).await;

    let body = if duration.subsec_nanos() == 0 {
        format!("The request slept for {} seconds\r\n", duration.as_secs())
    } else {
        format!("The request slept for {} ms\r\n", duration.as_millis())
    };

    Response::ok(body)
}
