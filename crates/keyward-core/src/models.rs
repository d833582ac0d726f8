//! Domain models for keyward.
//!
//! These are the core types shared across all crates. Deletion markers
//! are a storage concern and never appear here: every model returned by
//! a repository is live.

pub mod application;
pub mod permission;
pub mod role;
