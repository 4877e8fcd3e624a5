//! Middleware and the continuation chain.
//!
//! Middleware intercepts a request before its handler and is the right place
//! for cross-cutting concerns: authentication, request-id injection, tracing.
//! Each route carries its own ordered middleware list; the chain runs them
//! first to last and then the handler.
//!
//! A middleware decides whether the request proceeds by consuming its
//! [`Next`]. Dropping it instead halts the chain: nothing registered after
//! that middleware runs, the handler included. `Next::run` takes `self`, so
//! the rest of the chain can be entered at most once.
//!
//! ```rust
//! use http::StatusCode;
//! use wisp::middleware::{middleware_fn, Middleware};
//!
//! let require_auth = middleware_fn(|ctx, res, req, next| Box::pin(async move {
//!     if req.header("authorization").is_some() {
//!         ctx.insert("authorized", "true");
//!         next.run(ctx, res, req).await;
//!     } else {
//!         res.set_status(StatusCode::UNAUTHORIZED);
//!     }
//! }));
//! let chain = vec![require_auth.boxed()];
//! # let _ = chain;
//! ```

mod trace;

use std::sync::Arc;

use crate::context::Context;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::route::Route;

pub use trace::{Trace, trace};

/// A type-erased middleware, shareable between routes.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// An interceptor on a route's chain.
///
/// Implemented for every function or closure with the signature
///
/// ```text
/// for<'a> Fn(&'a mut Context, &'a mut ResponseWriter, &'a Request, Next<'a>) -> BoxFuture<'a>
/// ```
///
/// (closures via [`middleware_fn`]); stateful middleware implement it directly.
pub trait Middleware: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        req: &'a Request,
        next: Next<'a>,
    ) -> BoxFuture<'a>;

    /// Erases `self` for use in a route's middleware list.
    fn boxed(self) -> BoxedMiddleware
    where
        Self: Sized,
    {
        Arc::new(self)
    }
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a mut Context, &'a mut ResponseWriter, &'a Request, Next<'a>) -> BoxFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        req: &'a Request,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        self(ctx, res, req, next)
    }
}

/// Pins a closure to the middleware signature.
pub fn middleware_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Context, &'a mut ResponseWriter, &'a Request, Next<'a>) -> BoxFuture<'a>
        + Send
        + Sync
        + 'static,
{
    f
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The continuation handed to a middleware: a cursor into its route's chain.
///
/// `run` invokes the middleware at the cursor with a continuation one step
/// further along, or the handler once the cursor has passed the last
/// middleware.
#[must_use = "dropping `Next` halts the chain; call `run` to continue"]
pub struct Next<'a> {
    route: &'a Route,
    cursor: usize,
}

impl<'a> Next<'a> {
    /// A continuation positioned before the first middleware of `route`.
    pub(crate) fn start(route: &'a Route) -> Self {
        Self { route, cursor: 0 }
    }

    /// Steps left after the middleware holding this `Next`, handler included.
    ///
    /// The last middleware on a route sees `1` (just the handler).
    pub fn remaining(&self) -> usize {
        self.route.middlewares().len() - self.cursor + 1
    }

    /// Continues the chain.
    pub fn run<'b>(
        self,
        ctx: &'b mut Context,
        res: &'b mut ResponseWriter,
        req: &'b Request,
    ) -> BoxFuture<'b>
    where
        'a: 'b,
    {
        let route = self.route;
        match route.middlewares().get(self.cursor) {
            Some(middleware) => {
                let next = Next { route, cursor: self.cursor + 1 };
                middleware.call(ctx, res, req, next)
            }
            None => route.handler().call(ctx, res, req),
        }
    }
}
