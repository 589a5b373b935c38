//! twinprobe-request: builds per-plugin request descriptors.
//!
//! The builder is a fail-closed gate: while the shared manifest flag is
//! unhealthy it refuses every call with
//! [`RequestError::DependencyConflict`], including calls with no
//! identifiers, so callers can never mistake "manifest broken" for
//! "nothing to build".

pub mod builder;
pub mod error;

pub use builder::{JSON_CONTENT_TYPE, PluginRequestBuilder, RequestDescriptor};
pub use error::{RequestError, RequestResult};
