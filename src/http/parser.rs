use std::collections::HashMap;
use std::fmt;

use crate::http::request::{Method, Request};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request line with fewer than three space-separated tokens
    MalformedRequestLine,
    /// Header line without a colon
    InvalidHeader,
    /// POST body pair without `=`
    InvalidFormBody,
    /// Request head is not valid UTF-8
    InvalidEncoding,
    InvalidContentLength,
    /// More bytes accumulated than the configured maximum
    TooLarge,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ParseError::MalformedRequestLine => "malformed request line",
            ParseError::InvalidHeader => "header line without a colon",
            ParseError::InvalidFormBody => "form body pair without '='",
            ParseError::InvalidEncoding => "request is not valid UTF-8",
            ParseError::InvalidContentLength => "invalid Content-Length",
            ParseError::TooLarge => "request exceeds the maximum size",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ParseError {}

/// Parses one complete request frame into a fresh [`Request`].
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let mut request = Request::default();
    parse_into(buf, &mut request)?;
    Ok(request)
}

/// Parses one complete request frame, overwriting every field of `req`.
///
/// `req` usually comes from the request pool and may hold values from a
/// previous cycle; on error its contents are unspecified.
pub fn parse_into(buf: &[u8], req: &mut Request) -> Result<(), ParseError> {
    let (head, body) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], &buf[end + 4..]),
        None => (buf, &[][..]),
    };

    let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;
    let mut lines = head.split("\r\n");

    // Request line
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ParseError::MalformedRequestLine);
    };

    req.method = Method::from(method);
    req.version.clear();
    req.version.push_str(version);

    req.path.clear();
    req.path.push_str(target);
    if !req.path.ends_with('/') {
        req.path.push('/');
    }

    req.query.clear();
    if let Some((_, query)) = target.split_once('?') {
        req.query.extend(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }

    // Headers
    req.headers.clear();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        req.headers
            .insert(key.trim_end().to_string(), value.trim().to_string());
    }

    // Body
    let declared = match req.headers.get("Content-Length") {
        Some(v) => Some(v.parse::<usize>().map_err(|_| ParseError::InvalidContentLength)?),
        None => None,
    };
    let body = match declared {
        Some(len) => &body[..len.min(body.len())],
        None => trim_line_padding(body),
    };
    req.body.clear();
    req.body.extend_from_slice(body);

    req.form = if req.method == Method::POST {
        Some(parse_form(body)?)
    } else {
        None
    };

    req.params.clear();
    req.is_static = false;

    Ok(())
}

/// Decodes a `key=value&key=value` body. Every non-empty pair needs an `=`.
pub fn parse_form(body: &[u8]) -> Result<HashMap<String, String>, ParseError> {
    let text = std::str::from_utf8(body).map_err(|_| ParseError::InvalidEncoding)?;
    let text = text.trim_end_matches(['\r', '\n', '\0']);

    let mut form = HashMap::new();
    for pair in text.split('&').filter(|p| !p.is_empty()) {
        if !pair.contains('=') {
            return Err(ParseError::InvalidFormBody);
        }
        if let Some((key, value)) = url::form_urlencoded::parse(pair.as_bytes()).next() {
            form.insert(key.into_owned(), value.into_owned());
        }
    }
    Ok(form)
}

/// Length of the first complete request in `buf`, if there is one.
///
/// The head ends at the first blank line. With a `Content-Length` header the
/// frame also spans that many body bytes. Without one, a POST takes
/// everything already buffered after its head (the body must have arrived in
/// the same read) and any other method ends at the blank line.
///
/// Returns `Ok(None)` while more bytes are needed, and `TooLarge` once the
/// frame cannot fit in `max_size` bytes.
pub fn request_frame_len(buf: &[u8], max_size: usize) -> Result<Option<usize>, ParseError> {
    let Some(headers_end) = find_headers_end(buf) else {
        return if buf.len() > max_size {
            Err(ParseError::TooLarge)
        } else {
            Ok(None)
        };
    };

    let body_start = headers_end + 4;
    let head = &buf[..headers_end];
    let frame_len = match declared_content_length(head)? {
        Some(len) => body_start.checked_add(len).ok_or(ParseError::TooLarge)?,
        None if head.starts_with(b"POST ") => buf.len(),
        None => body_start,
    };

    if frame_len > max_size {
        Err(ParseError::TooLarge)
    } else if frame_len > buf.len() {
        Ok(None)
    } else {
        Ok(Some(frame_len))
    }
}

/// Number of leading CRLF bytes left over between requests.
pub fn leading_blank_lines(buf: &[u8]) -> usize {
    buf.chunks(2).take_while(|c| *c == b"\r\n").count() * 2
}

fn declared_content_length(head: &[u8]) -> Result<Option<usize>, ParseError> {
    let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;
    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .filter(|(key, _)| key.trim_end() == "Content-Length")
        .last()
        .map(|(_, value)| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength)
        })
        .transpose()
}

fn trim_line_padding(body: &[u8]) -> &[u8] {
    let end = body
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n' | b'\0'))
        .map_or(0, |i| i + 1);
    &body[..end]
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
