use expresso::{Config, Cookie, Server, StatusCode};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let tls = cfg.tls.clone();

    let server = Server::new(cfg)
        .use_middleware(|req, res| {
            tracing::info!(method = %req.method, path = %req.path, "request");
            res.header("X-Powered-By", "expresso");
        })
        .get("/", |_req, res| res.send("Hello from expresso\n"))
        .get("/hello/:name?", |req, res| {
            let name = req.param("name").unwrap_or("stranger").to_string();
            res.set_cookie(Cookie::new("greeted", name.as_str()).path("/"));
            res.send(format!("hello, {name}\n"));
        })
        .post("/echo", |req, res| {
            let mut fields: Vec<_> = req
                .form
                .iter()
                .flatten()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            fields.sort();
            res.send(fields.join("\n"));
        })
        .get("/old", |_req, res| {
            res.redirect("/");
            res.send("");
        })
        .get("/private", |_req, res| res.error(StatusCode::Forbidden, "Forbidden\n"))
        .static_dir("/static", "./public");

    tokio::select! {
        res = async {
            match tls {
                Some(tls) => server.listen_tls(&tls.cert, &tls.key).await,
                None => server.listen().await,
            }
        } => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
