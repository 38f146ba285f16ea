use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::files::resolve;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::router::matcher::{Params, PathMatcher, PatternError};

/// A route handler. Must end the response with `send`, `send_file` or `error`.
pub type Handler = Arc<dyn Fn(&mut Request, &mut Response) + Send + Sync + 'static>;

/// Runs before every matched handler, in registration order.
pub type Middleware = Arc<dyn Fn(&mut Request, &mut Response) + Send + Sync + 'static>;

/// A compiled template bound to its handler.
#[derive(Clone)]
pub struct Route {
    pub matcher: PathMatcher,
    pub handler: Handler,
}

/// A route prefix mapped to a directory on disk.
#[derive(Debug, Clone)]
pub struct StaticRoute {
    pub matcher: PathMatcher,
    pub root: PathBuf,
}

/// Result of looking a request up in the tables.
pub enum Resolution<'a> {
    /// A static route matched and named a file
    File(PathBuf),
    /// A static route matched but captured nothing usable
    EmptyCapture,
    Route(&'a Route, Params),
    NotFound,
}

/// Route tables under construction. Turned into a [`Router`] before serving.
#[derive(Default)]
pub struct RouterBuilder {
    get: Vec<Route>,
    post: Vec<Route>,
    statics: Vec<StaticRoute>,
    middleware: Vec<Middleware>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn middleware(&mut self, middleware: Middleware) {
        self.middleware.push(middleware);
    }

    pub fn route(&mut self, method: Method, template: &str, handler: Handler) -> Result<(), PatternError> {
        let route = Route {
            matcher: PathMatcher::compile(template)?,
            handler,
        };
        match method {
            Method::GET => self.get.push(route),
            Method::POST => self.post.push(route),
            other => {
                tracing::warn!(method = %other, template, "only GET and POST routes are served, ignoring");
            }
        }
        Ok(())
    }

    /// Maps `prefix` (trailing slashes ignored) to `root`. The part of the
    /// path after the prefix is the file path relative to `root`.
    pub fn static_dir(&mut self, prefix: &str, root: impl Into<PathBuf>) -> Result<(), PatternError> {
        let template = format!("{}/*", prefix.trim_end_matches('/'));
        self.statics.push(StaticRoute {
            matcher: PathMatcher::compile(&template)?,
            root: root.into(),
        });
        Ok(())
    }

    pub fn build(self) -> Router {
        Router {
            get: self.get,
            post: self.post,
            statics: self.statics,
            middleware: self.middleware,
        }
    }
}

/// Immutable route tables shared by every connection.
pub struct Router {
    get: Vec<Route>,
    post: Vec<Route>,
    statics: Vec<StaticRoute>,
    middleware: Vec<Middleware>,
}

impl Router {
    /// Finds what should answer `method path`.
    ///
    /// Static routes (GET only) are checked first, then the method's own
    /// table, each in registration order. The first match wins.
    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        if *method == Method::GET {
            for route in &self.statics {
                if let Some(params) = route.matcher.matches(path) {
                    let capture = params.get("0").map(String::as_str).unwrap_or_default();
                    return match resolve(&route.root, capture) {
                        Some(file) => Resolution::File(file),
                        None => Resolution::EmptyCapture,
                    };
                }
            }
        }

        let table = match method {
            Method::GET => &self.get,
            Method::POST => &self.post,
            _ => return Resolution::NotFound,
        };

        table
            .iter()
            .find_map(|route| route.matcher.matches(path).map(|params| Resolution::Route(route, params)))
            .unwrap_or(Resolution::NotFound)
    }

    /// Routes `req` and runs middleware plus at most one handler.
    ///
    /// A static match ends with `send_file`; the file itself is loaded by the
    /// connection. When nothing matches, the response becomes a 404.
    pub fn dispatch(&self, req: &mut Request, res: &mut Response) {
        match self.resolve(&req.method, &req.path) {
            Resolution::File(file) => {
                debug!(path = %req.path, file = %file.display(), "static route matched");
                req.is_static = true;
                self.run_middleware(req, res);
                res.send_file(file);
            }
            Resolution::Route(route, params) => {
                debug!(method = %req.method, path = %req.path, route = route.matcher.template(), "route matched");
                req.params = params;
                self.run_middleware(req, res);
                (route.handler)(req, res);
            }
            Resolution::EmptyCapture | Resolution::NotFound => {
                debug!(method = %req.method, path = %req.path, "no route matched");
                res.error(StatusCode::NotFound, not_found_message(req));
            }
        }
    }

    fn run_middleware(&self, req: &mut Request, res: &mut Response) {
        for middleware in &self.middleware {
            middleware(req, res);
        }
    }
}

pub fn not_found_message(req: &Request) -> String {
    format!("Cannot {} {}\nNot Found", req.method, req.path)
}
