//! Registered routes and the chain executor.

use std::fmt;

use crate::context::Context;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::method::RouteMethod;
use crate::middleware::{BoxedMiddleware, Next};
use crate::request::Request;
use crate::response::ResponseWriter;

/// What a [`Mux`](crate::Mux) invokes when a request matches a pattern.
pub trait Endpoint: Send + Sync + 'static {
    fn serve<'a>(&'a self, res: &'a mut ResponseWriter, req: &'a Request) -> BoxFuture<'a>;
}

/// One registration: method, path, its composite key, the middleware chain
/// and the terminal handler. Built once by the [`Router`](crate::Router) and
/// never mutated afterwards.
pub struct Route {
    method: RouteMethod,
    path: String,
    key: String,
    middlewares: Vec<BoxedMiddleware>,
    handler: BoxedHandler,
}

impl Route {
    pub(crate) fn new(
        method: RouteMethod,
        path: &str,
        middlewares: Vec<BoxedMiddleware>,
        handler: BoxedHandler,
    ) -> Self {
        let key = method.composite_key(path);
        Self { method, path: path.to_owned(), key, middlewares, handler }
    }

    pub fn method(&self) -> &RouteMethod { &self.method }
    pub fn path(&self) -> &str { &self.path }

    /// The pattern this route was registered under, e.g. `"GET /users/{id}"`.
    pub fn key(&self) -> &str { &self.key }

    pub fn middlewares(&self) -> &[BoxedMiddleware] { &self.middlewares }
    pub(crate) fn handler(&self) -> &BoxedHandler { &self.handler }

    /// Runs the chain for one request with a fresh [`Context`].
    ///
    /// Middleware run in registration order, then the handler. A middleware
    /// that drops its [`Next`] ends the request there. Panics inside the
    /// chain are not caught here.
    pub async fn execute(&self, res: &mut ResponseWriter, req: &Request) {
        let mut ctx = Context::new();
        Next::start(self).run(&mut ctx, res, req).await;
    }
}

impl Endpoint for Route {
    fn serve<'a>(&'a self, res: &'a mut ResponseWriter, req: &'a Request) -> BoxFuture<'a> {
        Box::pin(self.execute(res, req))
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("key", &self.key)
            .field("middlewares", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}
