//! # wisp
//!
//! A small HTTP dispatch layer: register a handler under a method and a path,
//! put an ordered list of middleware in front of it, and let each request walk
//! that list before it reaches the handler.
//!
//! ## The pieces
//!
//! - [`Router`] — the route table. `request(method, path, middlewares,
//!   handler)` plus one shortcut per verb. Method `"*"` matches any method.
//! - [`Route`] — one registration and its chain executor. Middleware run in
//!   order; each one decides whether to continue by consuming its [`Next`].
//! - [`Context`] — string map created per request and lent to every step.
//! - [`Mux`] / [`ServeMux`] — the pattern facility the router registers into.
//!   It owns path matching and conflict detection.
//! - [`Server`] — hyper + tokio host with graceful shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::StatusCode;
//! use wisp::middleware::{self, middleware_fn, Middleware};
//! use wisp::{BoxFuture, Context, Request, ResponseWriter, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), wisp::Error> {
//!     let auth = middleware_fn(|ctx, res, req, next| Box::pin(async move {
//!         match req.header("x-user") {
//!             Some(user) => {
//!                 ctx.insert("user", user);
//!                 next.run(ctx, res, req).await;
//!             }
//!             None => res.set_status(StatusCode::UNAUTHORIZED),
//!         }
//!     }))
//!     .boxed();
//!
//!     let mut app = Router::new();
//!     app.get("/users/{id}", vec![middleware::trace().boxed(), auth.clone()], get_user)?
//!        .post("/users", vec![auth], create_user)?;
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! fn get_user<'a>(ctx: &'a mut Context, res: &'a mut ResponseWriter, req: &'a Request) -> BoxFuture<'a> {
//!     Box::pin(async move {
//!         let id = req.param("id").unwrap_or("unknown");
//!         let by = ctx.get("user").unwrap_or("anonymous");
//!         res.json(format!(r#"{{"id":"{id}","requested_by":"{by}"}}"#));
//!     })
//! }
//!
//! fn create_user<'a>(_ctx: &'a mut Context, res: &'a mut ResponseWriter, req: &'a Request) -> BoxFuture<'a> {
//!     Box::pin(async move {
//!         if req.body().is_empty() {
//!             res.set_status(StatusCode::BAD_REQUEST);
//!             return;
//!         }
//!         res.set_status(StatusCode::CREATED);
//!         res.json(r#"{"id":"99"}"#);
//!     })
//! }
//! ```

mod context;
mod error;
mod handler;
mod method;
mod mux;
mod request;
mod response;
mod route;
mod router;
mod server;

pub mod health;
pub mod middleware;

pub use context::Context;
pub use error::Error;
pub use handler::{BoxFuture, BoxedHandler, Handler, handler_fn};
pub use method::{ANY_METHOD, RouteMethod, composite_key};
pub use middleware::{BoxedMiddleware, Middleware, Next, middleware_fn};
pub use mux::{BoxedEndpoint, Mux, ServeMux};
pub use request::Request;
pub use response::{ContentType, ResponseWriter};
pub use route::{Endpoint, Route};
pub use router::Router;
pub use server::Server;
