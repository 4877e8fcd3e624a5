//! Minimal wisp demo: a few JSON endpoints behind per-route middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users -H 'x-user: alice' -d '{"name":"bob"}'
//!   curl -X POST http://localhost:3000/users -d '{"name":"bob"}'      # 401
//!   curl -X DELETE http://localhost:3000/health

use http::StatusCode;
use wisp::middleware::{self, Middleware, middleware_fn};
use wisp::{BoxFuture, Context, Request, ResponseWriter, Router, Server, health};

#[tokio::main]
async fn main() -> Result<(), wisp::Error> {
    tracing_subscriber::fmt::init();

    // Continues only for requests that say who they are.
    let identify = middleware_fn(|ctx, res, req, next| Box::pin(async move {
        match req.header("x-user") {
            Some(user) => {
                ctx.insert("user", user);
                next.run(ctx, res, req).await;
            }
            None => {
                res.set_status(StatusCode::UNAUTHORIZED);
                res.text("who are you?");
            }
        }
    }))
    .boxed();
    let trace = middleware::trace().boxed();

    let mut app = Router::new();
    app.any("/health", vec![], health::ping)?
        .get("/users/{id}", vec![trace.clone()], get_user)?
        .post("/users", vec![trace.clone(), identify.clone()], create_user)?
        .delete("/users/{id}", vec![trace, identify], delete_user)?;

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// GET /users/{id}
fn get_user<'a>(_ctx: &'a mut Context, res: &'a mut ResponseWriter, req: &'a Request) -> BoxFuture<'a> {
    Box::pin(async move {
        let id = req.param("id").unwrap_or("unknown");
        res.json(format!(r#"{{"id":"{id}","name":"alice"}}"#));
    })
}

// POST /users
//
// req.body() is &[u8]; parse it with serde_json::from_slice or similar.
fn create_user<'a>(ctx: &'a mut Context, res: &'a mut ResponseWriter, req: &'a Request) -> BoxFuture<'a> {
    Box::pin(async move {
        if req.body().is_empty() {
            res.set_status(StatusCode::BAD_REQUEST);
            return;
        }
        let by = ctx.get("user").unwrap_or_default();
        res.set_status(StatusCode::CREATED);
        res.insert_header(http::header::LOCATION, http::HeaderValue::from_static("/users/99"));
        res.json(format!(r#"{{"id":"99","created_by":"{by}"}}"#));
    })
}

// DELETE /users/{id} → 204 No Content
fn delete_user<'a>(_ctx: &'a mut Context, res: &'a mut ResponseWriter, _req: &'a Request) -> BoxFuture<'a> {
    Box::pin(async move { res.set_status(StatusCode::NO_CONTENT) })
}
