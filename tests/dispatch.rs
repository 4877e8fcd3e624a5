use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::StatusCode;
use wisp::middleware::{Middleware, middleware_fn};
use wisp::{
    BoxFuture, BoxedMiddleware, Context, Error, Handler, Next, Request, ResponseWriter, Router,
    composite_key, handler_fn, health,
};

type Calls = Arc<Mutex<Vec<String>>>;

fn request(method: &str, path: &str) -> Request {
    Request::from(
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap(),
    )
}

/// Handler that records every invocation together with the context it saw.
struct Recorder {
    name: &'static str,
    calls: Calls,
}

impl Handler for Recorder {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        _req: &'a Request,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            let mut seen: Vec<_> = ctx.iter().map(|(k, v)| format!("{k}={v}")).collect();
            seen.sort();
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}[{}]", self.name, seen.join(",")));
            res.text(self.name);
        })
    }
}

fn recorder(name: &'static str, calls: &Calls) -> Recorder {
    Recorder { name, calls: Arc::clone(calls) }
}

/// Middleware that logs its name and continues.
fn mark(name: &'static str, calls: &Calls) -> BoxedMiddleware {
    let calls = Arc::clone(calls);
    middleware_fn(move |ctx, res, req, next| {
        calls.lock().unwrap().push(name.to_owned());
        Box::pin(async move { next.run(ctx, res, req).await })
    })
    .boxed()
}

/// Continues only if an earlier step set `authorized`.
struct RequireAuthorized;

impl Middleware for RequireAuthorized {
    fn call<'a>(
        &'a self,
        ctx: &'a mut Context,
        res: &'a mut ResponseWriter,
        req: &'a Request,
        next: Next<'a>,
    ) -> BoxFuture<'a> {
        Box::pin(async move {
            if ctx.get("authorized") == Some("true") {
                next.run(ctx, res, req).await;
            } else {
                res.set_status(StatusCode::UNAUTHORIZED);
                res.text("unauthorized");
            }
        })
    }
}

#[test]
fn composite_keys() {
    assert_eq!(composite_key("GET", "/a"), "GET /a");
    assert_eq!(composite_key("*", "/a"), "/a");
}

#[tokio::test]
async fn scenario_a_plain_get_reaches_handler_with_empty_context() {
    let calls = Calls::default();
    let mut app = Router::new();
    app.request("GET", "/hello", vec![], recorder("hello", &calls)).unwrap();

    let res = app.dispatch(request("GET", "/hello")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), b"hello");
    assert_eq!(*calls.lock().unwrap(), ["hello[]"]);
}

#[tokio::test]
async fn scenario_b_auth_gate_blocks_handler_without_flag() {
    let calls = Calls::default();
    let mut app = Router::new();
    app.request("POST", "/items", vec![RequireAuthorized.boxed()], recorder("create", &calls))
        .unwrap();

    let grant = middleware_fn(|ctx, res, req, next| Box::pin(async move {
        ctx.insert("authorized", "true");
        next.run(ctx, res, req).await;
    }));
    app.post(
        "/admin/items",
        vec![grant.boxed(), RequireAuthorized.boxed()],
        recorder("admin_create", &calls),
    )
    .unwrap();

    let denied = app.dispatch(request("POST", "/items")).await;
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);
    assert!(calls.lock().unwrap().is_empty());

    let allowed = app.dispatch(request("POST", "/admin/items")).await;
    assert_eq!(allowed.status(), StatusCode::OK);
    assert_eq!(*calls.lock().unwrap(), ["admin_create[authorized=true]"]);
}

#[tokio::test]
async fn scenario_c_wildcard_method_accepts_every_verb() {
    let mut app = Router::new();
    app.request("*", "/health", vec![], health::ping).unwrap();

    for method in ["GET", "POST", "DELETE"] {
        let res = app.dispatch(request(method, "/health")).await;
        assert_eq!(res.status(), StatusCode::OK, "{method}");
        assert_eq!(res.body(), b"pong", "{method}");
    }
}

#[tokio::test]
async fn scenario_d_duplicate_key_fails_and_first_stays_active() {
    let calls = Calls::default();
    let mut app = Router::new();
    app.request("GET", "/dup", vec![], recorder("first", &calls)).unwrap();

    let err = app.get("/dup", vec![], recorder("second", &calls)).err();
    assert!(matches!(err, Some(Error::Conflict { .. })));

    let res = app.dispatch(request("GET", "/dup")).await;
    assert_eq!(res.body(), b"first");
    assert_eq!(app.routes().len(), 1);
}

#[tokio::test]
async fn every_middleware_then_handler_in_order_exactly_once() {
    let calls = Calls::default();
    let mut app = Router::new();
    app.get(
        "/chain",
        vec![mark("m1", &calls), mark("m2", &calls), mark("m3", &calls)],
        recorder("h", &calls),
    )
    .unwrap();

    app.dispatch(request("GET", "/chain")).await;

    assert_eq!(*calls.lock().unwrap(), ["m1", "m2", "m3", "h[]"]);
}

#[tokio::test]
async fn halting_middleware_skips_everything_after_it() {
    let calls = Calls::default();
    let halt = {
        let calls = Arc::clone(&calls);
        middleware_fn(move |_ctx, res, _req, _next| {
            calls.lock().unwrap().push("halt".to_owned());
            Box::pin(async move { res.set_status(StatusCode::FORBIDDEN) })
        })
    };

    let mut app = Router::new();
    app.get(
        "/halt",
        vec![mark("m1", &calls), halt.boxed(), mark("m3", &calls)],
        recorder("h", &calls),
    )
    .unwrap();

    let res = app.dispatch(request("GET", "/halt")).await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(*calls.lock().unwrap(), ["m1", "halt"]);
}

#[tokio::test]
async fn context_does_not_leak_between_requests() {
    let calls = Calls::default();
    let tag_once = {
        let seen = Arc::new(Mutex::new(false));
        middleware_fn(move |ctx, res, req, next| {
            let first = !std::mem::replace(&mut *seen.lock().unwrap(), true);
            Box::pin(async move {
                if first {
                    ctx.insert("user", "alice");
                }
                next.run(ctx, res, req).await;
            })
        })
    };

    let mut app = Router::new();
    app.get("/me", vec![tag_once.boxed()], recorder("me", &calls)).unwrap();

    app.dispatch(request("GET", "/me")).await;
    app.dispatch(request("GET", "/me")).await;

    assert_eq!(*calls.lock().unwrap(), ["me[user=alice]", "me[]"]);
}

#[tokio::test]
async fn path_params_are_visible_to_middleware_and_handler() {
    let mut app = Router::new();
    let copy_id = middleware_fn(|ctx, res, req, next| Box::pin(async move {
        if let Some(id) = req.param("id") {
            ctx.insert("id", id);
        }
        next.run(ctx, res, req).await;
    }));
    app.get(
        "/users/{id}",
        vec![copy_id.boxed()],
        handler_fn(|ctx, res, req| Box::pin(async move {
            let from_ctx = ctx.get("id").unwrap_or_default().to_owned();
            res.text(format!("{from_ctx}/{}", req.param("id").unwrap_or_default()));
        })),
    )
    .unwrap();

    let res = app.dispatch(request("GET", "/users/42")).await;
    assert_eq!(res.body(), b"42/42");
}

#[tokio::test]
async fn unmatched_requests_get_host_statuses() {
    let mut app = Router::new();
    app.get("/only-get", vec![], health::ping).unwrap();

    assert_eq!(app.dispatch(request("GET", "/nope")).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        app.dispatch(request("POST", "/only-get")).await.status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
}

#[tokio::test]
async fn chain_that_writes_nothing_yields_empty_ok() {
    let mut app = Router::new();
    let silent = middleware_fn(|_ctx, _res, _req, _next| Box::pin(async {}));
    app.get("/silent", vec![silent.boxed()], health::ping).unwrap();

    let res = app.dispatch(request("GET", "/silent")).await;
    assert!(!res.is_written());
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.body().is_empty());
}
