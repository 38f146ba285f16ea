//! Request routing.
//!
//! Templates are compiled by [`matcher`] when a route is registered. The
//! [`table`] module keeps GET, POST and static routes in registration order
//! and freezes them into a [`Router`] before the first connection is
//! accepted.

pub mod matcher;
pub mod table;

pub use matcher::{Params, PathMatcher, PatternError};
pub use table::{Handler, Middleware, Resolution, Route, Router, RouterBuilder, StaticRoute};
