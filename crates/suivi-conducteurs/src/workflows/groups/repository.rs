use std::collections::BTreeSet;

use super::domain::{
    Group, GroupExtension, GroupHistoryEntry, GroupId, NewHistoryEntry, NewPermission, NewUser,
    Permission, PermissionId, User, UserId, UserProfile,
};
use crate::store::RepositoryError;

/// Accounts, groups, permissions and their audit history.
///
/// Write methods report whether anything changed so callers can publish
/// events for real changes only.
pub trait DirectoryRepository {
    fn user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    /// Fails with `Conflict` when the username is taken.
    fn insert_user(&mut self, user: NewUser) -> Result<User, RepositoryError>;
    fn update_user(&mut self, user: User) -> Result<(), RepositoryError>;

    fn group(&self, id: GroupId) -> Result<Option<Group>, RepositoryError>;
    fn group_by_name(&self, name: &str) -> Result<Option<Group>, RepositoryError>;
    fn insert_group(&mut self, name: &str) -> Result<Group, RepositoryError>;
    /// Removes the group together with its memberships, permission links,
    /// extension and history.
    fn delete_group(&mut self, id: GroupId) -> Result<Group, RepositoryError>;

    fn permission(&self, id: PermissionId) -> Result<Option<Permission>, RepositoryError>;
    fn insert_permission(&mut self, permission: NewPermission)
        -> Result<Permission, RepositoryError>;

    fn add_member(&mut self, group: GroupId, user: UserId) -> Result<bool, RepositoryError>;
    fn remove_member(&mut self, group: GroupId, user: UserId) -> Result<bool, RepositoryError>;
    /// Groups of a user, ordered by name.
    fn groups_for_user(&self, user: UserId) -> Result<Vec<Group>, RepositoryError>;

    fn grant_permission(
        &mut self,
        group: GroupId,
        permission: PermissionId,
    ) -> Result<bool, RepositoryError>;
    fn revoke_permission(
        &mut self,
        group: GroupId,
        permission: PermissionId,
    ) -> Result<bool, RepositoryError>;
    fn group_permissions(&self, group: GroupId) -> Result<BTreeSet<PermissionId>, RepositoryError>;

    fn record_history(
        &mut self,
        entry: NewHistoryEntry,
    ) -> Result<GroupHistoryEntry, RepositoryError>;
    /// History of a group, oldest first.
    fn history(&self, group: GroupId) -> Result<Vec<GroupHistoryEntry>, RepositoryError>;

    fn profile(&self, user: UserId) -> Result<Option<UserProfile>, RepositoryError>;
    fn save_profile(&mut self, profile: UserProfile) -> Result<(), RepositoryError>;
    fn group_extension(&self, group: GroupId) -> Result<Option<GroupExtension>, RepositoryError>;
    fn save_group_extension(&mut self, extension: GroupExtension) -> Result<(), RepositoryError>;
}
