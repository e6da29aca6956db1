//! Users, groups and permissions, with explicit reactions to membership
//! changes (audit trail, profiles, evaluator provisioning).

mod audit;
pub mod domain;
pub mod events;
mod profiles;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use audit::AuditTrail;
pub use domain::{
    Group, GroupAction, GroupExtension, GroupHistoryEntry, GroupId, MembershipChange,
    NewPermission, NewUser, Permission, PermissionChange, PermissionId, User, UserId,
    UserProfile, UserUpdate, UNDEFINED_FIELD,
};
pub use events::{DirectoryEvent, DirectoryEventHandler};
pub use profiles::ProfileProvisioner;
pub use repository::DirectoryRepository;
pub use router::group_router;
pub use service::{DirectoryError, GroupDirectory};
