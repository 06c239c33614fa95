//! Path-based dispatch
//!
//! The table is built once at startup and shared read-only between all
//! connections. Exact routes win; otherwise the longest prefix route that
//! ends on a segment boundary is chosen.

use std::sync::Arc;

use crate::config::{Config, HandlerKind, MatchMode};
use crate::handlers::{ApiHandler, Handler, StaticFiles};
use crate::http::parser::split_target;
use crate::store::EntityStore;

#[derive(Debug)]
pub struct Route {
    path: String,
    mode: MatchMode,
    handler: Handler,
}

impl Route {
    /// `path` is normalized the same way request paths are.
    pub fn new(path: &str, mode: MatchMode, handler: Handler) -> Self {
        let (path, _) = split_target(path);
        Self { path, mode, handler }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The part of `path` after this route, or `None` if it does not match.
    fn remainder<'p>(&self, path: &'p str) -> Option<&'p str> {
        match self.mode {
            MatchMode::Exact => (path == self.path).then_some(""),
            MatchMode::Prefix => {
                let prefix = self.path.trim_end_matches('/');
                let rest = path.strip_prefix(prefix)?;
                (rest.is_empty() || rest.starts_with('/')).then_some(rest)
            }
        }
    }
}

/// A resolved route and the sub-path handed to its handler.
#[derive(Debug)]
pub struct RouteMatch<'r, 'p> {
    pub route: &'r Route,
    pub sub_path: &'p str,
}

#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Builds the table described by `cfg`. API routes share `store`.
    pub fn from_config(cfg: &Config, store: Arc<EntityStore>) -> Self {
        let routes = cfg
            .routes
            .iter()
            .map(|route| {
                let handler = match route.handler {
                    HandlerKind::Echo => Handler::Echo,
                    HandlerKind::Static => Handler::Static(StaticFiles::new(
                        route.root.clone().unwrap_or_default(),
                    )),
                    HandlerKind::Health => Handler::Health,
                    HandlerKind::Sleep => Handler::Sleep(cfg.sleep_duration()),
                    HandlerKind::Api => Handler::Api(ApiHandler::new(Arc::clone(&store))),
                };
                Route::new(&route.path, route.match_mode(), handler)
            })
            .collect();

        Self::new(routes)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Finds the handler for a normalized request path.
    pub fn resolve<'r, 'p>(&'r self, path: &'p str) -> Option<RouteMatch<'r, 'p>> {
        let exact = self
            .routes
            .iter()
            .filter(|route| route.mode == MatchMode::Exact)
            .find_map(|route| route.remainder(path).map(|sub_path| (route, sub_path)));

        let found = exact.or_else(|| {
            self.routes
                .iter()
                .filter(|route| route.mode == MatchMode::Prefix)
                .filter_map(|route| route.remainder(path).map(|sub_path| (route, sub_path)))
                .max_by_key(|(route, _)| route.path.len())
        });

        found.map(|(route, sub_path)| RouteMatch { route, sub_path })
    }
}
