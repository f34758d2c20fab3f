//! Core request abstractions for the edge cache directives engine.
//!
//! This crate provides the collaborators the cache engine reads from:
//! - `RequestIdentity` trait - Current user, group and URI of a request
//! - `RequestParameters` trait - Named request parameters
//! - `RequestContext` - Owned request context for rendering
//! - `RequestParams` - Ordered parameter map with query string parsing

mod context;
mod params;

pub use context::*;
pub use params::*;
