//! Source adapter boundary.
//!
//! A source turns a [`SourceQuery`] into a stream of [`Candidate`](crate::candidate::Candidate)s.
//! Campaigns reach their source through a [`SourceRouter`], which picks one
//! adapter per category.

mod http_json;
mod router;
mod types;

pub use http_json::{HttpJsonSource, SourceConfig};
pub use router::SourceRouter;
pub use types::*;
