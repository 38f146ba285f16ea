//! Content-type detection from body bytes.
//!
//! Responses never rely on file extensions: the first bytes of the payload
//! decide the `Content-Type`, falling back to plain text for readable UTF-8
//! and to `application/octet-stream` for anything else.

use mime::Mime;

const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"\x00asm", "application/wasm"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
];

/// Sniffs the media type of `body`.
///
/// ```
/// # use expresso::http::mime::sniff;
/// assert_eq!(sniff(b"hi").essence_str(), "text/plain");
/// assert_eq!(sniff(b"<!DOCTYPE html><p>x</p>").essence_str(), "text/html");
/// ```
pub fn sniff(body: &[u8]) -> Mime {
    if let Some((_, media)) = SIGNATURES.iter().find(|(magic, _)| body.starts_with(magic)) {
        return media.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }
    if body.len() >= 12 && body.starts_with(b"RIFF") && &body[8..12] == b"WEBP" {
        return "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }

    let Ok(text) = std::str::from_utf8(body) else {
        return mime::APPLICATION_OCTET_STREAM;
    };
    if text.contains('\0') {
        return mime::APPLICATION_OCTET_STREAM;
    }

    let lead = text.trim_start();
    let lead_lower = lead
        .get(..lead.len().min(16))
        .unwrap_or_default()
        .to_ascii_lowercase();

    if lead_lower.starts_with("<!doctype html") || lead_lower.starts_with("<html") {
        mime::TEXT_HTML_UTF_8
    } else if lead_lower.starts_with("<?xml") {
        "text/xml; charset=utf-8".parse().unwrap_or(mime::TEXT_XML)
    } else if lead_lower.starts_with("<svg") {
        mime::IMAGE_SVG
    } else if looks_like_json(lead) {
        mime::APPLICATION_JSON
    } else {
        mime::TEXT_PLAIN_UTF_8
    }
}

fn looks_like_json(text: &str) -> bool {
    let text = text.trim_end();
    (text.starts_with('{') && text.ends_with('}')) || (text.starts_with('[') && text.ends_with(']'))
}
