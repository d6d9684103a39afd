use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::http::request::Request;
use crate::http::response::Response;

/// A request handler. Handlers run on the connection's task and are expected
/// to return promptly.
pub type Handler = Arc<dyn Fn(&Request) -> Response + Send + Sync>;

/// Startup wiring mistakes. Never produced while serving requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("route {0} already exists")]
    DuplicateRoute(String),
}

/// Exact-match route table.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Handler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::DuplicateRoute`] if `path` is taken; the
    /// existing handler stays in place.
    pub fn add_route<F>(&mut self, path: impl Into<String>, handler: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        let path = path.into();
        if self.routes.contains_key(&path) {
            return Err(ConfigurationError::DuplicateRoute(path));
        }

        tracing::debug!(path = %path, "Registered route");
        self.routes.insert(path, Arc::new(handler));
        Ok(())
    }

    /// Chaining form of [`Router::add_route`].
    pub fn route<F>(mut self, path: impl Into<String>, handler: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.add_route(path, handler)?;
        Ok(self)
    }

    /// Runs the handler registered for the request's path, or answers 404.
    pub fn dispatch(&self, request: &Request) -> Response {
        match self.routes.get(request.path()) {
            Some(handler) => handler(request),
            None => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path(),
                    "No route matched"
                );
                Response::not_found()
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        f.debug_struct("Router").field("routes", &paths).finish()
    }
}
