//! Background jobs spawned at startup and stopped on shutdown.

pub mod session_cleanup;
