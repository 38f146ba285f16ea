use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{Config, ServerConfig};
use crate::files::FileCache;
use crate::http::connection::Connection;
use crate::http::pool::{DEFAULT_POOL_CAPACITY, Pool};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::router::{PatternError, Router, RouterBuilder};
use crate::server::{listener, tls};

/// Registration surface for an application.
///
/// Routes and middleware are added here; [`listen`](Server::listen) and
/// [`listen_tls`](Server::listen_tls) consume the builder, so nothing can be
/// registered once serving has started.
///
/// ```no_run
/// # async fn run() -> anyhow::Result<()> {
/// use expresso::{Config, Server};
///
/// Server::new(Config::default())
///     .get("/hello/:name?", |req, res| {
///         let name = req.param("name").unwrap_or("world").to_string();
///         res.send(format!("hello {name}"));
///     })
///     .static_dir("/assets", "./public")
///     .listen()
///     .await
/// # }
/// ```
pub struct Server {
    config: Config,
    routes: RouterBuilder,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            routes: RouterBuilder::new(),
        }
    }

    /// Appends a middleware. Middleware runs for every matched request, in
    /// registration order, before the handler.
    pub fn use_middleware<F>(mut self, middleware: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.routes.middleware(Arc::new(middleware));
        self
    }

    /// Registers a GET route.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template; see [`Server::try_route`].
    pub fn get<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.must_route(Method::GET, path, handler)
    }

    /// Registers a POST route.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid template; see [`Server::try_route`].
    pub fn post<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.must_route(Method::POST, path, handler)
    }

    /// Registers a route, reporting template errors instead of panicking.
    pub fn try_route<F>(mut self, method: Method, path: &str, handler: F) -> Result<Self, PatternError>
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.routes.route(method, path, Arc::new(handler))?;
        Ok(self)
    }

    /// Serves files under `dir` for GET requests whose path starts with
    /// `route`.
    ///
    /// # Panics
    ///
    /// Panics if `route` is not a valid template prefix.
    pub fn static_dir(mut self, route: &str, dir: impl AsRef<Path>) -> Self {
        let dir: PathBuf = dir.as_ref().to_path_buf();
        self.routes
            .static_dir(route, dir)
            .unwrap_or_else(|e| panic!("invalid static route `{route}`: {e}"));
        self
    }

    /// Freezes the registrations into a shareable [`App`].
    pub fn build(self) -> Arc<App> {
        Arc::new(App {
            router: self.routes.build(),
            requests: Pool::new(DEFAULT_POOL_CAPACITY),
            responses: Pool::new(DEFAULT_POOL_CAPACITY),
            cache: FileCache::from_config(&self.config.cache),
            settings: self.config.server,
        })
    }

    /// Binds the configured address and serves plain HTTP. Only binding can
    /// fail; accept errors are logged and skipped.
    pub async fn listen(self) -> anyhow::Result<()> {
        let addr = self.config.listen_addr();
        let app = self.build();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("Listening on {}", addr);

        listener::run(listener, app).await
    }

    /// Binds the configured address and serves HTTPS with the given PEM
    /// certificate chain and private key.
    pub async fn listen_tls(self, cert: impl AsRef<Path>, key: impl AsRef<Path>) -> anyhow::Result<()> {
        let acceptor = tls::load_tls_acceptor(cert.as_ref(), key.as_ref())?;
        let addr = self.config.listen_addr();
        let app = self.build();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        info!("Listening on {} (TLS)", addr);

        listener::run_tls(listener, acceptor, app).await
    }

    fn must_route<F>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(&mut Request, &mut Response) + Send + Sync + 'static,
    {
        self.routes
            .route(method, path, Arc::new(handler))
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }
}

/// Everything a connection needs, frozen at startup and shared by all
/// connection tasks.
pub struct App {
    router: Router,
    requests: Pool<Request>,
    responses: Pool<Response>,
    cache: FileCache,
    settings: ServerConfig,
}

impl App {
    /// Runs the request loop for one accepted stream.
    pub async fn serve_connection<S>(self: &Arc<Self>, stream: S) -> anyhow::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        Connection::new(stream, Arc::clone(self)).run().await
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn requests(&self) -> &Pool<Request> {
        &self.requests
    }

    pub fn responses(&self) -> &Pool<Response> {
        &self.responses
    }

    pub fn cache(&self) -> &FileCache {
        &self.cache
    }

    pub fn settings(&self) -> &ServerConfig {
        &self.settings
    }
}
