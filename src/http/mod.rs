//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.1 subset the server speaks, with
//! support for keep-alive connections.
//!
//! # Architecture
//!
//! - **`connection`**: The per-connection request loop and its state machine
//! - **`parser`**: Frames and parses incoming requests from byte buffers
//! - **`request`**: HTTP request representation
//! - **`response`**: HTTP response under construction, with terminal calls
//! - **`cookie`**: `Set-Cookie` values
//! - **`mime`**: Content-type sniffing from body bytes
//! - **`writer`**: Serializes and writes responses to the client
//! - **`pool`**: Recycles request and response holders between cycles
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Accumulate one complete request
//!        └──────┬──────┘
//!               │ Parsed (400/413 + close on failure)
//!               ▼
//!        ┌──────────────────┐
//!        │     Parsed       │ ← Route, run middleware and handler
//!        └──────┬───────────┘
//!               │
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatched     │ ← Load files, finalize, write
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ KeepAlive → Reading (same connection)
//!               └─ Closed
//! ```
//!
//! A connection closes when the client sends `Connection: close`, when reuse
//! is disabled, or after `max_reuse` reuses.

pub mod connection;
pub mod cookie;
pub mod mime;
pub mod parser;
pub mod pool;
pub mod request;
pub mod response;
pub mod writer;
