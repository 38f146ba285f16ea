//! Tests for route registration, resolution and dispatch

use expresso::http::parser::parse_http_request;
use expresso::http::request::{Method, Request};
use expresso::http::response::{Outcome, Response, StatusCode};
use expresso::router::{Handler, Middleware, Resolution, Router, RouterBuilder};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn handler(body: &'static str) -> Handler {
    Arc::new(move |_req: &mut Request, res: &mut Response| res.send(body))
}

fn get(path: &str) -> Request {
    parse_http_request(format!("GET {path} HTTP/1.1\r\nHost: x\r\n\r\n").as_bytes()).unwrap()
}

fn dispatch(router: &Router, mut req: Request) -> (Request, Response) {
    let mut res = Response::new(StatusCode::Ok);
    router.dispatch(&mut req, &mut res);
    (req, res)
}

#[test]
fn test_first_registered_route_wins() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/users/:id", handler("A")).unwrap();
    builder.route(Method::GET, "/users/:name", handler("B")).unwrap();
    let router = builder.build();

    let (_, res) = dispatch(&router, get("/users/42"));
    assert_eq!(res.body, b"A".to_vec());
}

#[test]
fn test_only_one_handler_runs_per_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut builder = RouterBuilder::new();
    for _ in 0..3 {
        let calls = Arc::clone(&calls);
        builder
            .route(
                Method::GET,
                "/same",
                Arc::new(move |_req: &mut Request, res: &mut Response| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    res.send("ok");
                }),
            )
            .unwrap();
    }
    let router = builder.build();

    dispatch(&router, get("/same"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_params_are_bound_to_request() {
    let mut builder = RouterBuilder::new();
    builder
        .route(
            Method::GET,
            "/posts/:year(\\d+)/:slug",
            Arc::new(|req: &mut Request, res: &mut Response| {
                let body = format!("{}:{}", req.param("year").unwrap(), req.param("slug").unwrap());
                res.send(body);
            }),
        )
        .unwrap();
    let router = builder.build();

    let (req, res) = dispatch(&router, get("/posts/2024/hello-world"));
    assert_eq!(req.params.len(), 2);
    assert_eq!(res.body, b"2024:hello-world".to_vec());
}

#[test]
fn test_optional_param_absent_still_dispatches() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/hello/:name?", handler("hi")).unwrap();
    let router = builder.build();

    let (req, res) = dispatch(&router, get("/hello/"));
    assert_eq!(req.param("name"), None);
    assert_eq!(res.status, StatusCode::Ok);
    assert_eq!(res.body, b"hi".to_vec());
}

#[test]
fn test_get_and_post_tables_are_separate() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/items", handler("list")).unwrap();
    builder.route(Method::POST, "/items", handler("create")).unwrap();
    let router = builder.build();

    let post = parse_http_request(b"POST /items HTTP/1.1\r\n\r\nname=x").unwrap();
    let (_, res) = dispatch(&router, post);
    assert_eq!(res.body, b"create".to_vec());

    let (_, res) = dispatch(&router, get("/items"));
    assert_eq!(res.body, b"list".to_vec());
}

#[test]
fn test_other_methods_are_not_found() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/items", handler("list")).unwrap();
    let router = builder.build();

    let put = parse_http_request(b"PUT /items HTTP/1.1\r\n\r\n").unwrap();
    let (_, res) = dispatch(&router, put);
    assert_eq!(res.status, StatusCode::NotFound);
}

#[test]
fn test_unmatched_path_is_not_found() {
    let router = RouterBuilder::new().build();

    let (_, res) = dispatch(&router, get("/missing/"));
    assert_eq!(res.status, StatusCode::NotFound);
    assert!(String::from_utf8_lossy(&res.body).contains("Not Found"));
}

#[test]
fn test_static_routes_are_checked_first() {
    let mut builder = RouterBuilder::new();
    builder.route(Method::GET, "/assets/*", handler("dynamic")).unwrap();
    builder.static_dir("/assets/", "public").unwrap();
    let router = builder.build();

    let (req, res) = dispatch(&router, get("/assets/css/site.css"));
    assert!(req.is_static);
    assert_eq!(
        res.outcome(),
        &Outcome::File(PathBuf::from("public/css/site.css"))
    );
}

#[test]
fn test_static_empty_capture_is_not_found() {
    let mut builder = RouterBuilder::new();
    builder.static_dir("/assets", "public").unwrap();
    let router = builder.build();

    assert!(matches!(
        router.resolve(&Method::GET, "/assets/"),
        Resolution::EmptyCapture
    ));

    let (req, res) = dispatch(&router, get("/assets/"));
    assert!(!req.is_static);
    assert_eq!(res.status, StatusCode::NotFound);
    assert_eq!(res.outcome(), &Outcome::Sent);
}

#[test]
fn test_static_path_traversal_is_not_found() {
    let mut builder = RouterBuilder::new();
    builder.static_dir("/assets", "public").unwrap();
    let router = builder.build();

    let (_, res) = dispatch(&router, get("/assets/../Cargo.toml"));
    assert_eq!(res.status, StatusCode::NotFound);
}

#[test]
fn test_static_routes_ignore_post() {
    let mut builder = RouterBuilder::new();
    builder.static_dir("/assets", "public").unwrap();
    let router = builder.build();

    assert!(matches!(
        router.resolve(&Method::POST, "/assets/a.css/"),
        Resolution::NotFound
    ));
}

#[test]
fn test_middleware_runs_in_order_before_handler() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut builder = RouterBuilder::new();
    for name in ["first", "second"] {
        let log = Arc::clone(&log);
        let middleware: Middleware = Arc::new(move |_req: &mut Request, res: &mut Response| {
            log.lock().unwrap().push(name);
            res.header("X-Seen", name);
        });
        builder.middleware(middleware);
    }
    let handler_log = Arc::clone(&log);
    builder
        .route(
            Method::GET,
            "/",
            Arc::new(move |_req: &mut Request, res: &mut Response| {
                handler_log.lock().unwrap().push("handler");
                res.send("done");
            }),
        )
        .unwrap();
    let router = builder.build();

    let (_, res) = dispatch(&router, get("/"));
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "handler"]);
    assert_eq!(res.headers.get("X-Seen").unwrap(), "second");
}

#[test]
fn test_middleware_skipped_when_nothing_matches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut builder = RouterBuilder::new();
    let counter = Arc::clone(&calls);
    builder.middleware(Arc::new(move |_req: &mut Request, _res: &mut Response| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    let router = builder.build();

    dispatch(&router, get("/nothing"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_template_is_reported() {
    let mut builder = RouterBuilder::new();
    assert!(builder.route(Method::GET, "/broken/:", handler("x")).is_err());
}
