//! Pattern-matching dispatch facility.
//!
//! The [`Router`](crate::Router) does not match paths itself. It hands each
//! composite key to a [`Mux`] and lets the mux decide what conflicts and what
//! matches. [`ServeMux`] is the built-in one:
//!
//! - patterns are `"METHOD /path"` or a bare `"/path"` (any method);
//! - path syntax is [`matchit`]'s: `{name}` captures one segment, `{*rest}`
//!   captures the remainder;
//! - one radix tree per method plus one method-agnostic tree, each giving
//!   O(path-length) lookup.
//!
//! Lookup order for a request is: its own method's tree, then `GET` for a
//! `HEAD` request, then the method-agnostic tree. If nothing matches but the
//! path exists under other methods the answer is `405` with an `Allow` header,
//! otherwise `404`.

use std::collections::HashMap;
use std::iter;
use std::sync::Arc;

use http::header::{ALLOW, HeaderValue};
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::ResponseWriter;
use crate::route::Endpoint;

/// A shared, type-erased endpoint.
pub type BoxedEndpoint = Arc<dyn Endpoint>;

/// The host's registration and dispatch facility.
///
/// Registration happens at startup through `&mut self`; dispatch runs
/// concurrently through `&self` once the mux is shared.
pub trait Mux: Send + Sync + 'static {
    /// Registers `endpoint` under `pattern`.
    ///
    /// Fails when the pattern is malformed or overlaps an existing one. A
    /// failed call leaves the mux unchanged.
    fn register_pattern(&mut self, pattern: &str, endpoint: BoxedEndpoint) -> Result<(), Error>;

    /// Routes `req` to the best-matching endpoint and returns what it wrote.
    fn dispatch(&self, req: Request) -> BoxFuture<'_, ResponseWriter>;
}

/// Method-aware radix-tree mux.
#[derive(Default)]
pub struct ServeMux {
    by_method: HashMap<Method, MatchitRouter<BoxedEndpoint>>,
    any: MatchitRouter<BoxedEndpoint>,
}

/// Result of matching a method and path against the registered patterns.
pub(crate) enum Lookup<'m> {
    Found(&'m BoxedEndpoint, HashMap<String, String>),
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

impl ServeMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        let head_fallback = match *method {
            Method::HEAD => self.by_method.get(&Method::GET),
            _ => None,
        };
        let trees = self
            .by_method
            .get(method)
            .into_iter()
            .chain(head_fallback)
            .chain(iter::once(&self.any));

        for tree in trees {
            if let Ok(matched) = tree.at(path) {
                let params = matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                return Lookup::Found(matched.value, params);
            }
        }

        let mut allowed: Vec<Method> = self
            .by_method
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.clone())
            .collect();
        if allowed.is_empty() {
            return Lookup::NotFound;
        }
        if allowed.contains(&Method::GET) && !allowed.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
        allowed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Lookup::MethodNotAllowed(allowed)
    }
}

impl Mux for ServeMux {
    fn register_pattern(&mut self, pattern: &str, endpoint: BoxedEndpoint) -> Result<(), Error> {
        let (method, path) = parse_pattern(pattern)?;
        let tree = match method {
            Some(method) => self.by_method.entry(method).or_default(),
            None => &mut self.any,
        };
        tree.insert(path, endpoint).map_err(|source| Error::Conflict {
            pattern: pattern.to_owned(),
            source,
        })?;
        debug!(pattern, "pattern registered");
        Ok(())
    }

    fn dispatch(&self, mut req: Request) -> BoxFuture<'_, ResponseWriter> {
        Box::pin(async move {
            let mut res = ResponseWriter::new();
            match self.lookup(req.method(), req.path()) {
                Lookup::Found(endpoint, params) => {
                    req.params = params;
                    endpoint.serve(&mut res, &req).await;
                }
                Lookup::MethodNotAllowed(allowed) => {
                    let allow = allowed.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
                    if let Ok(value) = HeaderValue::from_str(&allow) {
                        res.insert_header(ALLOW, value);
                    }
                    res.set_status(StatusCode::METHOD_NOT_ALLOWED);
                    res.text("method not allowed");
                }
                Lookup::NotFound => {
                    res.set_status(StatusCode::NOT_FOUND);
                    res.text("not found");
                }
            }
            res
        })
    }
}

/// Splits `"METHOD /path"` or `"/path"` into its parts.
fn parse_pattern(pattern: &str) -> Result<(Option<Method>, &str), Error> {
    let invalid = |reason| Error::InvalidPattern { pattern: pattern.to_owned(), reason };

    let (method, path) = match pattern.split_once(' ') {
        Some((token, path)) => {
            if token.is_empty() {
                return Err(invalid("empty method"));
            }
            let method = Method::from_bytes(token.as_bytes()).map_err(|_| invalid("bad method token"))?;
            (Some(method), path)
        }
        None => (None, pattern),
    };

    if !path.starts_with('/') {
        return Err(invalid("path must start with `/`"));
    }
    Ok((method, path))
}
