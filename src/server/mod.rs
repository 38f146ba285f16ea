//! Listener setup and the application registration surface.

pub mod app;
pub mod listener;
pub mod tls;

pub use app::{App, Server};
