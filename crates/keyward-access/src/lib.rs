//! Keyward Access — role provisioning and permission aggregation.
//!
//! Everything here is generic over the repository traits in
//! `keyward-core`, so the same logic runs on either storage backend.

pub mod permission;
pub mod provision;

pub use permission::PermissionService;
pub use provision::RoleProvisioner;
