use expresso::http::cookie::Cookie;
use expresso::http::response::{Outcome, Response, StatusCode};
use expresso::http::writer::serialize_response;
use std::path::PathBuf;

fn serialized(res: &Response) -> String {
    String::from_utf8(serialize_response(res)).unwrap()
}

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::Created.as_u16(), 201);
    assert_eq!(StatusCode::NoContent.as_u16(), 204);
    assert_eq!(StatusCode::Found.as_u16(), 302);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::PayloadTooLarge.as_u16(), 413);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::Found.reason_phrase(), "Found");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(
        StatusCode::InternalServerError.reason_phrase(),
        "Internal Server Error"
    );
}

#[test]
fn test_send_defaults_to_200() {
    let mut res = Response::new(StatusCode::Ok);
    res.send("hi");

    assert!(res.is_finished());
    assert_eq!(res.status, StatusCode::Ok);
    assert_eq!(res.body, b"hi".to_vec());
}

#[test]
fn test_finalize_adds_standard_headers() {
    let mut res = Response::new(StatusCode::Ok);
    res.send("hi");
    res.finalize("expresso");

    assert_eq!(res.headers.get("Server").unwrap(), "expresso");
    assert_eq!(res.headers.get("Content-Length").unwrap(), "2");
    assert_eq!(
        res.headers.get("Content-Type").unwrap(),
        "text/plain; charset=utf-8"
    );
    let date = res.headers.get("Date").unwrap();
    assert!(date.ends_with(" GMT"));
    assert!(httpdate::parse_http_date(date).is_ok());
}

#[test]
fn test_finalize_keeps_explicit_content_type() {
    let mut res = Response::new(StatusCode::Ok);
    res.header("Content-Type", "application/vnd.custom");
    res.send("{}");
    res.finalize("expresso");

    assert_eq!(
        res.headers.get("Content-Type").unwrap(),
        "application/vnd.custom"
    );
}

#[test]
fn test_only_first_terminal_call_counts() {
    let mut res = Response::new(StatusCode::Ok);
    res.send("first");
    res.send("second");
    res.error(StatusCode::InternalServerError, "third");

    assert_eq!(res.status, StatusCode::Ok);
    assert_eq!(res.body, b"first".to_vec());
}

#[test]
fn test_error_sets_status_and_message() {
    let mut res = Response::new(StatusCode::Ok);
    res.error(StatusCode::NotFound, "Cannot GET /x/\nNot Found");

    assert_eq!(res.status, StatusCode::NotFound);
    assert_eq!(res.body, b"Cannot GET /x/\nNot Found".to_vec());
}

#[test]
fn test_send_file_defers_loading() {
    let mut res = Response::new(StatusCode::Ok);
    res.send_file("public/index.html");

    assert!(res.is_finished());
    assert_eq!(res.outcome(), &Outcome::File(PathBuf::from("public/index.html")));
    assert!(res.body.is_empty());
}

#[test]
fn test_redirect_is_not_terminal() {
    let mut res = Response::new(StatusCode::Ok);
    res.redirect("/login");

    assert!(!res.is_finished());
    assert_eq!(res.status, StatusCode::Found);
    assert_eq!(res.headers.get("Location").unwrap(), "/login");

    res.send("");
    assert!(res.is_finished());
    assert_eq!(res.status, StatusCode::Found);
}

#[test]
fn test_header_replaces_previous_value() {
    let mut res = Response::new(StatusCode::Ok);
    res.header("X-Custom", "one").header("X-Custom", "two");

    assert_eq!(res.headers.get("X-Custom").unwrap(), "two");
}

#[test]
fn test_set_cookie_defaults_max_age() {
    let mut res = Response::new(StatusCode::Ok);
    res.set_cookie(Cookie::new("session", "abc"));

    assert_eq!(res.cookies[0].max_age, Some(86_400));
}

#[test]
fn test_serialized_response_layout() {
    let mut res = Response::new(StatusCode::Ok);
    res.header("X-Custom", "value");
    res.set_cookie(Cookie::new("a", "1"));
    res.delete_cookie("b");
    res.send("body");
    res.finalize("expresso");

    let raw = serialized(&res);
    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(raw.contains("X-Custom: value\r\n"));
    assert!(raw.contains("Content-Length: 4\r\n"));
    assert!(raw.contains("Set-Cookie: a=1; Max-Age=86400\r\n"));
    assert!(raw.contains("Set-Cookie: b=0; Max-Age=0\r\n"));
    assert!(raw.ends_with("\r\n\r\nbody"));
}

#[test]
fn test_serialized_error_status_line() {
    let mut res = Response::new(StatusCode::Ok);
    res.error(StatusCode::BadRequest, "nope");
    res.finalize("expresso");

    assert!(serialized(&res).starts_with("HTTP/1.1 400 Bad Request\r\n"));
}
