//! # HTTP Middleware
//!
//! Request-level concerns applied in `crate::app`.

pub mod metrics;
