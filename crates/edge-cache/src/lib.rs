//! Cacheability policy and cache key derivation for rendered elements.
//!
//! This crate provides:
//! - `CacheDirectives` - Per-element cacheability flags and key policy
//! - `CacheFlags` - The five capability bits and their conjunctive merge
//! - `CacheKey` / `KeyDecision` - Cache key computation for a request
//! - `TimeoutPolicy` - Expiry policies and their proxy compatibility
//! - `CacheControl` - Response cache metadata derived from directives
//! - `ElementCacheConfig` - Declarative directives loaded from TOML or JSON
//!
//! # Example
//!
//! ```
//! use edge_cache::CacheDirectives;
//! use edge_core::{RequestContext, RequestParams};
//!
//! let directives = CacheDirectives::new(true)
//!     .with_uri(true)
//!     .with_user(true)
//!     .with_dynamic_parameters(["edit"]);
//!
//! let ctx = RequestContext::new("/a/b").with_user("alice");
//! let key = directives.compute_key(&ctx, None).unwrap();
//! assert_eq!(key.as_str(), "key_/a/balice");
//!
//! // Any trigger parameter makes the element dynamic
//! let params = RequestParams::from_query("edit=1");
//! assert!(directives.compute_key(&ctx, Some(&params)).is_none());
//! ```

mod config;
mod directives;
mod error;
mod flags;
mod headers;
mod key;
mod timeout;

pub use config::*;
pub use directives::*;
pub use error::*;
pub use flags::*;
pub use headers::*;
pub use key::*;
pub use timeout::*;
