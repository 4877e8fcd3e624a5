//! Per-request tracing middleware.

use std::time::Instant;

use tracing::info;

use super::{Middleware, Next};
use crate::context::Context;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::ResponseWriter;

/// Logs one `info` event per request with method, path, final status and latency.
///
/// Put it first on a route so the latency covers the rest of the chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

/// Shorthand for [`Trace`].
pub fn trace() -> Trace {
    Trace
}

impl Middleware for Trace {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        req: &'a Request,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            let start = Instant::now();
            next.run(ctx, res, req).await;
            info!(
                method = %req.method(),
                path = req.path(),
                status = res.status().as_u16(),
                latency_us = start.elapsed().as_micros() as u64,
                "request",
            );
        })
    }
}
