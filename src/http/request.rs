use std::collections::HashMap;

use crate::http::pool::Recycle;

/// HTTP request methods.
///
/// GET and POST have route tables of their own. Anything else still parses,
/// it simply never matches a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// GET - Retrieve a resource
    #[default]
    GET,
    /// POST - Create or submit data
    POST,
    PUT,
    DELETE,
    HEAD,
    OPTIONS,
    PATCH,
    /// Any other token found in the request line
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::Other(token) => token,
        }
    }
}

impl From<&str> for Method {
    /// Parses a method token. Matching is case-sensitive, so `get` becomes
    /// `Method::Other("get")`.
    ///
    /// ```
    /// # use expresso::http::request::Method;
    /// assert_eq!(Method::from("GET"), Method::GET);
    /// assert_eq!(Method::from("get"), Method::Other("get".into()));
    /// ```
    fn from(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            "OPTIONS" => Method::OPTIONS,
            "PATCH" => Method::PATCH,
            other => Method::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed HTTP request.
///
/// Instances are recycled through the connection's object pool, so every
/// field is overwritten by the parser on each cycle.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target, always ending with `/` (e.g. `/hello/`)
    pub path: String,
    /// HTTP version (typically "HTTP/1.1")
    pub version: String,
    /// Request headers, names as received; the last duplicate wins
    pub headers: HashMap<String, String>,
    /// Decoded query string of the request target
    pub query: HashMap<String, String>,
    /// `key=value&key=value` body pairs, present only for POST
    pub form: Option<HashMap<String, String>>,
    /// Raw body bytes following the header block
    pub body: Vec<u8>,
    /// Route parameters, keyed by capture name or position (`"0"`, `"1"`, ...)
    pub params: HashMap<String, String>,
    /// Set when the request was answered by a static route
    pub is_static: bool,
}

impl Request {
    /// Retrieves a header value by exact (case-sensitive) name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves a route parameter captured by the router.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.as_str())
    }

    /// Retrieves a decoded query string value.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|v| v.as_str())
    }

    /// Retrieves a form field from a POST body.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form.as_ref()?.get(key).map(|v| v.as_str())
    }

    /// Reads a cookie from the `Cookie` request header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("Cookie")?
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// True when the client sent exactly `Connection: close`.
    ///
    /// Any other value, or no header at all, leaves the connection eligible
    /// for keep-alive.
    pub fn wants_close(&self) -> bool {
        self.header("Connection") == Some("close")
    }
}

impl Recycle for Request {
    fn recycle(&mut self) {
        self.method = Method::GET;
        self.path.clear();
        self.version.clear();
        self.headers.clear();
        self.query.clear();
        self.form = None;
        self.body.clear();
        self.params.clear();
        self.is_static = false;
    }
}
