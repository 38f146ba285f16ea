use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::http::cookie::{Cookie, DEFAULT_MAX_AGE};
use crate::http::mime;
use crate::http::pool::Recycle;

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP status codes produced by the server and by handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCode {
    /// 200 OK
    #[default]
    Ok,
    /// 201 Created
    Created,
    /// 204 No Content
    NoContent,
    /// 301 Moved Permanently
    MovedPermanently,
    /// 302 Found
    Found,
    /// 303 See Other
    SeeOther,
    /// 400 Bad Request
    BadRequest,
    /// 401 Unauthorized
    Unauthorized,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 413 Payload Too Large
    PayloadTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use expresso::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::MovedPermanently => 301,
            StatusCode::Found => 302,
            StatusCode::SeeOther => 303,
            StatusCode::BadRequest => 400,
            StatusCode::Unauthorized => 401,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::PayloadTooLarge => 413,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::Found => "Found",
            StatusCode::SeeOther => "See Other",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::PayloadTooLarge => "Payload Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// What the handler decided to send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Outcome {
    /// No terminal call yet
    #[default]
    Pending,
    /// `send` or `error` filled in the body
    Sent,
    /// `send_file` named a file; the connection loads it through the cache
    File(PathBuf),
}

/// An HTTP response under construction.
///
/// Handlers and middleware mutate it with [`header`](Response::header),
/// [`set_cookie`](Response::set_cookie) and [`redirect`](Response::redirect),
/// then end it with exactly one of [`send`](Response::send),
/// [`send_file`](Response::send_file) or [`error`](Response::error). The
/// owning connection flushes it once the handler returns.
#[derive(Debug, Default)]
pub struct Response {
    pub version: String,
    pub status: StatusCode,
    /// Headers as key-value pairs; setting a name again replaces the value
    pub headers: HashMap<String, String>,
    /// One `Set-Cookie` line each
    pub cookies: Vec<Cookie>,
    pub body: Vec<u8>,
    outcome: Outcome,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            version: HTTP_VERSION.to_string(),
            status,
            ..Self::default()
        }
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Adds or replaces a header.
    pub fn header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Queues a cookie. An unset Max-Age becomes one day.
    pub fn set_cookie(&mut self, mut cookie: Cookie) -> &mut Self {
        cookie.max_age.get_or_insert(DEFAULT_MAX_AGE);
        self.cookies.push(cookie);
        self
    }

    /// Tells the client to drop a cookie right away.
    pub fn delete_cookie(&mut self, name: impl Into<String>) -> &mut Self {
        self.cookies.push(Cookie::removal(name));
        self
    }

    /// Points the client at `location` with a 302. The response still needs
    /// a terminal call, usually `send("")`.
    pub fn redirect(&mut self, location: impl Into<String>) -> &mut Self {
        self.status = StatusCode::Found;
        self.header("Location", location)
    }

    /// Sends `body` with the current status (200 unless changed).
    pub fn send(&mut self, body: impl AsRef<[u8]>) {
        if self.terminate(Outcome::Sent) {
            self.body.clear();
            self.body.extend_from_slice(body.as_ref());
        }
    }

    /// Sends the contents of a file, served from the static file cache.
    ///
    /// A file that cannot be read turns into a 404 when the response is
    /// flushed.
    pub fn send_file(&mut self, path: impl AsRef<Path>) {
        self.terminate(Outcome::File(path.as_ref().to_path_buf()));
    }

    /// Sends an error status with a plain message body.
    pub fn error(&mut self, status: StatusCode, message: impl AsRef<str>) {
        if self.terminate(Outcome::Sent) {
            self.status = status;
            self.body.clear();
            self.body.extend_from_slice(message.as_ref().as_bytes());
        }
    }

    /// True once a terminal call has been made.
    pub fn is_finished(&self) -> bool {
        self.outcome != Outcome::Pending
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Replaces a pending file with the bytes it resolved to.
    pub(crate) fn fill_file(&mut self, contents: &[u8]) {
        self.outcome = Outcome::Sent;
        self.body.clear();
        self.body.extend_from_slice(contents);
    }

    /// Discards whatever the handler produced, headers and cookies included.
    /// Used by the connection when a file cannot be read or no terminal call
    /// was made.
    pub(crate) fn replace_with_error(&mut self, status: StatusCode, message: &str) {
        self.outcome = Outcome::Pending;
        self.status = StatusCode::Ok;
        self.headers.clear();
        self.cookies.clear();
        self.error(status, message);
    }

    /// Fills in the standard header set right before the response is written.
    ///
    /// `Content-Type` is sniffed from the body unless a handler set one.
    pub fn finalize(&mut self, server_name: &str) {
        if self.version.is_empty() {
            self.version.push_str(HTTP_VERSION);
        }
        self.header("Server", server_name);
        self.header("Date", httpdate::fmt_http_date(SystemTime::now()));
        if !self.headers.contains_key("Content-Type") {
            let content_type = mime::sniff(&self.body).to_string();
            self.header("Content-Type", content_type);
        }
        let len = self.body.len().to_string();
        self.header("Content-Length", len);
    }

    fn terminate(&mut self, outcome: Outcome) -> bool {
        if self.is_finished() {
            tracing::warn!(
                status = self.status.as_u16(),
                "response already sent, ignoring extra terminal call"
            );
            return false;
        }
        self.outcome = outcome;
        true
    }
}

impl Recycle for Response {
    fn recycle(&mut self) {
        self.version.clear();
        self.status = StatusCode::Ok;
        self.headers.clear();
        self.cookies.clear();
        self.body.clear();
        self.outcome = Outcome::Pending;
    }
}
