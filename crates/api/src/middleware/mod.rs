//! Request gate middleware, installed with `axum::middleware::from_fn_with_state`.
//!
//! - [`security_headers::apply`] -- Adds hardening headers to every response.
//! - [`request_security::validate`] -- Rejects unsupported body content types
//!   and logs suspicious proxy headers.
//! - [`rate_limit::enforce`] -- Sliding-window admission per client and path.

pub mod rate_limit;
pub mod request_security;
pub mod security_headers;
