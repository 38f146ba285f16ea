//! Expresso - a small HTTP/1.1 server engine
//!
//! Parses requests straight off the socket, routes them through path
//! templates and middleware, and serves static files from a shared cache.

pub mod config;
pub mod files;
pub mod http;
pub mod router;
pub mod server;

pub use config::Config;
pub use http::cookie::Cookie;
pub use http::request::{Method, Request};
pub use http::response::{Response, StatusCode};
pub use server::{App, Server};
