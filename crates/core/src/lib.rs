//! Domain types and pure logic for the BioLens access layer.
//!
//! Nothing in this crate performs I/O. Storage lives in `biolens-store`,
//! orchestration in `biolens-access`.

pub mod client_identity;
pub mod clock;
pub mod error;
pub mod hashing;
pub mod privacy;
pub mod rate_limit;
pub mod session;
pub mod types;
pub mod validation;
