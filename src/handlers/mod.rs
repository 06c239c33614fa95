//! Request handlers
//!
//! The set of handlers is closed, so dispatch is a `match` over [`Handler`]
//! rather than a trait object. Every handler turns its own failures into a
//! [`Response`]; nothing here returns an error to the connection.

pub mod api;
pub mod echo;
pub mod health;
pub mod sleep;
pub mod static_files;

use std::time::Duration;

use crate::http::request::Request;
use crate::http::response::Response;

pub use api::ApiHandler;
pub use static_files::StaticFiles;

#[derive(Debug)]
pub enum Handler {
    /// Reflects the raw request back
    Echo,
    /// Serves files beneath a root directory
    Static(StaticFiles),
    /// Constant liveness response
    Health,
    /// Waits before answering
    Sleep(Duration),
    /// CRUD over the entity store
    Api(ApiHandler),
}

impl Handler {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Echo => "echo",
            Handler::Static(_) => "static",
            Handler::Health => "health",
            Handler::Sleep(_) => "sleep",
            Handler::Api(_) => "api",
        }
    }

    /// Handles `req`. `sub_path` is what follows the matched route prefix
    /// (empty for exact routes).
    pub async fn handle(&self, req: &Request, sub_path: &str) -> Response {
        match self {
            Handler::Echo => echo::handle(req),
            Handler::Static(files) => files.handle(sub_path).await,
            Handler::Health => health::handle(),
            Handler::Sleep(duration) => sleep::handle(*duration).await,
            Handler::Api(api) => api.handle(req, sub_path).await,
        }
    }
}
