//! Terminal handlers and type erasure.
//!
//! # How handlers are stored
//!
//! A route table holds handlers of *different* concrete types, so each one is
//! erased behind `Arc<dyn Handler>` at registration time:
//!
//! ```text
//! fn hello<'a>(ctx, res, req) -> BoxFuture<'a>    ← user writes this
//!        ↓ router.get("/", vec![], hello)
//! Arc::new(hello) as BoxedHandler                 ← blanket impl below
//!        ↓
//! handler.call(&mut ctx, &mut res, &req)          ← one vtable dispatch
//! ```
//!
//! Handlers borrow the context, the sink and the request for the duration of
//! the call, which is why the returned future carries the same lifetime.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::request::Request;
use crate::response::ResponseWriter;

/// A heap-allocated, type-erased future borrowing request state for `'a`.
pub type BoxFuture<'a, T = ()> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn Handler>;

/// The terminal step of a route.
///
/// Runs only after every middleware on the route has continued. It never
/// receives a continuation because nothing comes after it.
///
/// Implemented for every function or closure with the signature
///
/// ```text
/// for<'a> Fn(&'a mut Context, &'a mut ResponseWriter, &'a Request) -> BoxFuture<'a>
/// ```
///
/// Closures need [`handler_fn`] so the compiler can infer that signature.
/// Types carrying their own state can implement the trait directly.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        req: &'a Request,
    ) -> BoxFuture<'a>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context, &'a mut ResponseWriter, &'a Request) -> BoxFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        req: &'a Request,
    ) -> BoxFuture<'a> {
        self(ctx, res, req)
    }
}

/// Pins a closure to the handler signature.
///
/// ```rust
/// use wisp::{handler_fn, Router};
///
/// let mut app = Router::new();
/// app.get("/hello", vec![], handler_fn(|ctx, res, _req| Box::pin(async move {
///     let who = ctx.get("user").unwrap_or("world").to_owned();
///     res.text(format!("hello, {who}"));
/// })))
/// .unwrap();
/// ```
pub fn handler_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut Context, &'a mut ResponseWriter, &'a Request) -> BoxFuture<'a>
        + Send
        + Sync
        + 'static,
{
    f
}
