//! Static file serving: the shared content cache and the mapping from a
//! static-route capture to a path on disk.

pub mod cache;
pub mod resolve;

pub use cache::FileCache;
pub use resolve::resolve;
