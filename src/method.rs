//! Route method and composite routing keys.
//!
//! A route is registered either for one concrete HTTP method or for every
//! method, spelled `"*"`. The pair (method, path) folds into the single
//! pattern string handed to the [`Mux`](crate::Mux):
//!
//! | method  | path      | composite key |
//! |---------|-----------|---------------|
//! | `GET`   | `/a`      | `GET /a`      |
//! | `PATCH` | `/u/{id}` | `PATCH /u/{id}` |
//! | `*`     | `/health` | `/health`     |

use std::fmt;
use std::str::FromStr;

use http::Method;

use crate::error::Error;

/// The method-agnostic sentinel.
pub const ANY_METHOD: &str = "*";

/// The method half of a route registration.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum RouteMethod {
    /// Matches every request method.
    Any,
    /// Matches exactly one method.
    Only(Method),
}

impl RouteMethod {
    /// Returns the token as written in a composite key (`"*"` for [`Any`](Self::Any)).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => ANY_METHOD,
            Self::Only(method) => method.as_str(),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Builds the pattern string for `path` under this method.
    pub fn composite_key(&self, path: &str) -> String {
        match self {
            Self::Any => path.to_owned(),
            Self::Only(method) => format!("{method} {path}"),
        }
    }
}

/// Parses `"*"` or a method token. Tokens are case-sensitive per RFC 9110 §9.1,
/// so `"get"` is a distinct (extension) method, not `GET`.
impl FromStr for RouteMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ANY_METHOD {
            return Ok(Self::Any);
        }
        Method::from_bytes(s.as_bytes())
            .map(Self::Only)
            .map_err(|_| Error::InvalidMethod(s.to_owned()))
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key for a raw `(method, path)` pair.
///
/// Pure string function: `"*"` yields `path` verbatim, anything else yields
/// `"<method> <path>"`. No validation happens here; that is the job of
/// [`RouteMethod::from_str`] and the mux.
pub fn composite_key(method: &str, path: &str) -> String {
    if method == ANY_METHOD {
        path.to_owned()
    } else {
        format!("{method} {path}")
    }
}
