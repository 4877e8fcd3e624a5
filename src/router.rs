//! Route registration.
//!
//! [`Router::request`] is the one place a route is built: it folds method and
//! path into a composite key, wraps middleware and handler into a [`Route`],
//! and registers that route with the [`Mux`]. Every verb method is a one-line
//! call to `request` with a fixed method token.
//!
//! The router and the mux hold the same `Arc<Route>`: the mux needs it to
//! dispatch, the router keeps it so callers can list and inspect what was
//! registered. Registration takes `&mut self` and happens before the server
//! starts; once [`Server::serve`](crate::Server::serve) wraps the router in an
//! `Arc`, the table is only read.
//!
//! The mux checks for conflicts, so a route registered later never silently
//! shadows an earlier one. An error is returned instead.

use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::handler::{BoxFuture, Handler};
use crate::method::RouteMethod;
use crate::middleware::BoxedMiddleware;
use crate::mux::{Mux, ServeMux};
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::route::Route;

/// The application's route table.
///
/// Build it once at startup, then pass it to [`Server::serve`](crate::Server::serve).
/// Registration methods return `&mut Self` on success so calls chain with `?`:
///
/// ```rust,no_run
/// # use wisp::{BoxFuture, Context, Request, ResponseWriter, Router};
/// # fn get_user<'a>(_: &'a mut Context, _: &'a mut ResponseWriter, _: &'a Request) -> BoxFuture<'a> { Box::pin(async {}) }
/// # fn create_user<'a>(_: &'a mut Context, _: &'a mut ResponseWriter, _: &'a Request) -> BoxFuture<'a> { Box::pin(async {}) }
/// # fn main() -> Result<(), wisp::Error> {
/// let mut app = Router::new();
/// app.get("/users/{id}", vec![], get_user)?
///    .post("/users", vec![], create_user)?;
/// # Ok(())
/// # }
/// ```
///
/// A failed registration (malformed pattern, conflict with an earlier route)
/// returns the error and leaves every earlier registration in place.
pub struct Router<M = ServeMux> {
    mux: M,
    routes: Vec<Arc<Route>>,
}

impl Router<ServeMux> {
    pub fn new() -> Self {
        Self::with_mux(ServeMux::new())
    }
}

impl<M: Mux> Router<M> {
    /// A router that registers into a custom [`Mux`].
    pub fn with_mux(mux: M) -> Self {
        Self { mux, routes: Vec::new() }
    }

    /// Registers `handler` behind `middlewares` for `method` and `path`.
    ///
    /// `method` is a method token (`"GET"`, `"PURGE"`, ...) or `"*"` for every
    /// method. The middleware run in the given order before the handler.
    pub fn request(
        &mut self,
        method: &str,
        path: &str,
        middlewares: Vec<BoxedMiddleware>,
        handler: impl Handler,
    ) -> Result<&mut Self, Error> {
        let method: RouteMethod = method.parse()?;
        let route = Arc::new(Route::new(method, path, middlewares, Arc::new(handler)));

        // Only recorded once the mux has accepted it, so `routes()` never
        // lists something that cannot be dispatched.
        self.mux.register_pattern(route.key(), Arc::clone(&route) as _)?;
        debug!(key = route.key(), middlewares = route.middlewares().len(), "route registered");
        self.routes.push(route);
        Ok(self)
    }

    pub fn get(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("GET", path, middlewares, handler)
    }

    pub fn head(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("HEAD", path, middlewares, handler)
    }

    pub fn options(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("OPTIONS", path, middlewares, handler)
    }

    pub fn put(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("PUT", path, middlewares, handler)
    }

    pub fn post(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("POST", path, middlewares, handler)
    }

    pub fn patch(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("PATCH", path, middlewares, handler)
    }

    pub fn delete(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("DELETE", path, middlewares, handler)
    }

    /// Registers for every method (`"*"`).
    pub fn any(&mut self, path: &str, middlewares: Vec<BoxedMiddleware>, handler: impl Handler) -> Result<&mut Self, Error> {
        self.request("*", path, middlewares, handler)
    }

    /// Routes registered so far, in registration order.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    /// Finds a route by its composite key, e.g. `"GET /users/{id}"`.
    pub fn route(&self, key: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.key() == key).map(Arc::as_ref)
    }

    /// Routes one request through the mux without a network server.
    pub fn dispatch(&self, req: Request) -> BoxFuture<'_, ResponseWriter> {
        self.mux.dispatch(req)
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::middleware::{Middleware, middleware_fn};

    /// Mux that records patterns and refuses one of them.
    #[derive(Default)]
    struct RecordingMux {
        patterns: Arc<Mutex<Vec<String>>>,
        refuse: Option<&'static str>,
    }

    impl Mux for RecordingMux {
        fn register_pattern(&mut self, pattern: &str, _endpoint: crate::mux::BoxedEndpoint) -> Result<(), Error> {
            if self.refuse == Some(pattern) {
                return Err(Error::InvalidPattern { pattern: pattern.to_owned(), reason: "refused" });
            }
            self.patterns.lock().unwrap().push(pattern.to_owned());
            Ok(())
        }

        fn dispatch(&self, _req: Request) -> BoxFuture<'_, ResponseWriter> {
            Box::pin(async { ResponseWriter::new() })
        }
    }

    fn noop<'a>(_: &'a mut crate::Context, _: &'a mut ResponseWriter, _: &'a Request) -> BoxFuture<'a> {
        Box::pin(async {})
    }

    #[test]
    fn forwards_composite_keys_to_the_mux() {
        let mux = RecordingMux::default();
        let patterns = Arc::clone(&mux.patterns);
        let mut router = Router::with_mux(mux);

        router.get("/a", vec![], noop).unwrap()
            .any("/health", vec![], noop).unwrap()
            .request("PURGE", "/cache", vec![], noop).unwrap();

        assert_eq!(*patterns.lock().unwrap(), ["GET /a", "/health", "PURGE /cache"]);
    }

    #[test]
    fn verb_shortcuts_match_generic_registration() {
        let pass = middleware_fn(|ctx, res, req, next| Box::pin(async move {
            next.run(ctx, res, req).await
        }))
        .boxed();

        let cases: [(&str, &str); 7] = [
            ("GET", "/v/get"),
            ("HEAD", "/v/head"),
            ("OPTIONS", "/v/options"),
            ("PUT", "/v/put"),
            ("POST", "/v/post"),
            ("PATCH", "/v/patch"),
            ("DELETE", "/v/delete"),
        ];

        let mut shortcut = Router::new();
        shortcut.get("/v/get", vec![pass.clone()], noop).unwrap();
        shortcut.head("/v/head", vec![pass.clone()], noop).unwrap();
        shortcut.options("/v/options", vec![pass.clone()], noop).unwrap();
        shortcut.put("/v/put", vec![pass.clone()], noop).unwrap();
        shortcut.post("/v/post", vec![pass.clone()], noop).unwrap();
        shortcut.patch("/v/patch", vec![pass.clone()], noop).unwrap();
        shortcut.delete("/v/delete", vec![pass.clone()], noop).unwrap();

        let mut generic = Router::new();
        for (method, path) in cases {
            generic.request(method, path, vec![pass.clone()], noop).unwrap();
        }

        for (a, b) in shortcut.routes().iter().zip(generic.routes()) {
            assert_eq!(a.key(), b.key());
            assert_eq!(a.method(), b.method());
            assert_eq!(a.path(), b.path());
            assert_eq!(a.middlewares().len(), b.middlewares().len());
        }
        assert_eq!(shortcut.routes().len(), cases.len());
        assert_eq!(shortcut.route("PATCH /v/patch").map(Route::path), Some("/v/patch"));
    }

    #[test]
    fn failed_registration_keeps_table_unchanged() {
        let mux = RecordingMux { refuse: Some("POST /b"), ..Default::default() };
        let patterns = Arc::clone(&mux.patterns);
        let mut router = Router::with_mux(mux);

        router.get("/a", vec![], noop).unwrap();
        assert!(router.post("/b", vec![], noop).is_err());

        assert_eq!(router.routes().len(), 1);
        assert!(router.route("POST /b").is_none());
        assert_eq!(*patterns.lock().unwrap(), ["GET /a"]);
    }

    #[test]
    fn invalid_method_token_is_rejected_before_the_mux() {
        let mut router = Router::with_mux(RecordingMux::default());
        let err = router.request("BAD METHOD", "/a", vec![], noop).err();
        assert!(matches!(err, Some(Error::InvalidMethod(_))));
        assert!(router.routes().is_empty());
    }
}
