use std::fmt;
use std::time::SystemTime;

/// Max-Age written when a cookie does not configure one (one day).
pub const DEFAULT_MAX_AGE: i64 = 86_400;

/// A cookie to be sent in a `Set-Cookie` response header.
///
/// ```
/// # use expresso::http::cookie::Cookie;
/// let cookie = Cookie::new("session", "abc").path("/").http_only(true);
/// assert_eq!(cookie.to_string(), "session=abc; Path=/; Max-Age=86400; HttpOnly");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub expires: Option<SystemTime>,
    /// Seconds; [`DEFAULT_MAX_AGE`] when unset
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// A cookie that tells the client to drop `name` immediately.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "0").max_age(0)
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }
}

impl fmt::Display for Cookie {
    /// Formats the cookie as a `Set-Cookie` header value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(expires) = self.expires {
            write!(f, "; Expires={}", httpdate::fmt_http_date(expires))?;
        }
        write!(f, "; Max-Age={}", self.max_age.unwrap_or(DEFAULT_MAX_AGE))?;
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}
