//! Session lifecycle and request admission over the shared [`Store`].
//!
//! Both [`SessionManager`] and [`RateLimiter`] are backend-agnostic: they
//! take an `Arc<Store>` built by the process bootstrap and never see which
//! backend served a call.
//!
//! [`Store`]: biolens_store::Store

pub mod error;
pub mod rate_limiter;
pub mod session_manager;

pub use error::AccessError;
pub use rate_limiter::RateLimiter;
pub use session_manager::SessionManager;
