//! Built-in health-check handlers.
//!
//! | Handler | Body | Question |
//! |---|---|---|
//! | [`ping`] | `pong` | Is anything listening? |
//! | [`liveness`] | `ok` | Is the process alive? Failure → restart. |
//! | [`readiness`] | `ready` | Can it serve traffic? Failure → pulled from the load balancer. |
//!
//! Probes may arrive with any method, so register them method-agnostic:
//!
//! ```rust
//! use wisp::{Router, health};
//!
//! let mut app = Router::new();
//! app.any("/health", vec![], health::ping).unwrap()
//!    .get("/healthz", vec![], health::liveness).unwrap()
//!    .get("/readyz", vec![], health::readiness).unwrap();
//! ```
//!
//! Replace `readiness` with your own handler when readiness depends on
//! downstream services.

use crate::{BoxFuture, Context, Request, ResponseWriter};

pub fn ping<'a>(_ctx: &'a mut Context, res: &'a mut ResponseWriter, _req: &'a Request) -> BoxFuture<'a> {
    Box::pin(async move { res.text("pong") })
}

/// Always `200 OK` with body `"ok"`. Answering at all means alive.
pub fn liveness<'a>(_ctx: &'a mut Context, res: &'a mut ResponseWriter, _req: &'a Request) -> BoxFuture<'a> {
    Box::pin(async move { res.text("ok") })
}

/// `200 OK` with body `"ready"`.
pub fn readiness<'a>(_ctx: &'a mut Context, res: &'a mut ResponseWriter, _req: &'a Request) -> BoxFuture<'a> {
    Box::pin(async move { res.text("ready") })
}
