//! keyward core — domain models, repository contract, error taxonomy and
//! the transport mapping for access-control administration.

pub mod error;
pub mod models;
pub mod repository;
pub mod response;
