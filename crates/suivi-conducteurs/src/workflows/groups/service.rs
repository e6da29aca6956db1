use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use super::audit::AuditTrail;
use super::domain::{
    Group, GroupExtension, GroupHistoryEntry, GroupId, MembershipChange, NewPermission, NewUser,
    Permission, PermissionChange, PermissionId, User, UserId, UserProfile, UserUpdate,
};
use super::events::{DirectoryEvent, DirectoryEventHandler};
use super::profiles::ProfileProvisioner;
use super::repository::DirectoryRepository;
use crate::config::EvaluatorPolicy;
use crate::store::{RepositoryError, UnitOfWork};
use crate::workflows::evaluators::{EvaluatorRepository, EvaluatorSynchronizer, ServiceRepository};

/// Performs directory mutations and runs registered handlers in the same
/// transaction, in registration order.
pub struct GroupDirectory<S: UnitOfWork> {
    store: Arc<S>,
    handlers: Vec<Arc<dyn DirectoryEventHandler<S::Tx>>>,
}

impl<S> GroupDirectory<S>
where
    S: UnitOfWork,
    S::Tx: DirectoryRepository + ServiceRepository + EvaluatorRepository,
{
    /// Audit trail, profile provisioning, then evaluator synchronization.
    pub fn with_default_handlers(store: Arc<S>, policy: EvaluatorPolicy) -> Self {
        let mut directory = Self::new(store);
        directory.register(AuditTrail);
        directory.register(ProfileProvisioner);
        directory.register(EvaluatorSynchronizer::new(policy));
        directory
    }
}

impl<S> GroupDirectory<S>
where
    S: UnitOfWork,
    S::Tx: DirectoryRepository,
{
    /// Directory without any handler; events are raised but nobody reacts.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            handlers: Vec::new(),
        }
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: DirectoryEventHandler<S::Tx> + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    pub fn create_user(&self, new_user: NewUser) -> Result<User, DirectoryError> {
        if new_user.username.trim().is_empty() {
            return Err(DirectoryError::Invalid("username is required".to_string()));
        }

        let user = self.store.atomically(|tx| {
            let user = tx.insert_user(new_user).map_err(|err| match err {
                RepositoryError::Conflict => {
                    DirectoryError::Conflict("username already taken".to_string())
                }
                other => DirectoryError::Repository(other),
            })?;
            self.dispatch(
                tx,
                &DirectoryEvent::UserSaved {
                    user_id: user.id,
                    created: true,
                },
            )?;
            Ok::<_, DirectoryError>(user)
        })?;

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    pub fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User, DirectoryError> {
        self.store.atomically(|tx| {
            let mut user = tx
                .user(user_id)?
                .ok_or(DirectoryError::not_found("user", user_id.0))?;
            update.apply(&mut user);
            tx.update_user(user.clone())?;
            self.dispatch(
                tx,
                &DirectoryEvent::UserSaved {
                    user_id,
                    created: false,
                },
            )?;
            Ok(user)
        })
    }

    pub fn create_group(&self, name: &str) -> Result<Group, DirectoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DirectoryError::Invalid("group name is required".to_string()));
        }

        self.store.atomically(|tx| {
            let group = tx.insert_group(name).map_err(|err| match err {
                RepositoryError::Conflict => {
                    DirectoryError::Conflict(format!("group '{name}' already exists"))
                }
                other => DirectoryError::Repository(other),
            })?;
            self.dispatch(
                tx,
                &DirectoryEvent::GroupCreated {
                    group: group.clone(),
                },
            )?;
            Ok(group)
        })
    }

    pub fn delete_group(&self, group_id: GroupId) -> Result<Group, DirectoryError> {
        self.store.atomically(|tx| {
            let group = tx.delete_group(group_id).map_err(|err| match err {
                RepositoryError::NotFound => DirectoryError::not_found("group", group_id.0),
                other => DirectoryError::Repository(other),
            })?;
            self.dispatch(
                tx,
                &DirectoryEvent::GroupDeleted {
                    group: group.clone(),
                },
            )?;
            Ok(group)
        })
    }

    pub fn create_permission(
        &self,
        permission: NewPermission,
    ) -> Result<Permission, DirectoryError> {
        if permission.codename.trim().is_empty() {
            return Err(DirectoryError::Invalid(
                "permission codename is required".to_string(),
            ));
        }

        self.store.atomically(|tx| {
            tx.insert_permission(permission).map_err(|err| match err {
                RepositoryError::Conflict => {
                    DirectoryError::Conflict("permission codename already exists".to_string())
                }
                other => DirectoryError::Repository(other),
            })
        })
    }

    /// Adds users to a group. Users already in the group are left out of the
    /// change and of the raised event.
    pub fn add_members(
        &self,
        group_id: GroupId,
        user_ids: &[UserId],
    ) -> Result<MembershipChange, DirectoryError> {
        self.store.atomically(|tx| {
            let group = Self::require_group(tx, group_id)?;
            let mut added = Vec::new();
            for user_id in unique(user_ids) {
                Self::require_user(tx, user_id)?;
                if tx.add_member(group_id, user_id)? {
                    added.push(user_id);
                }
            }

            if !added.is_empty() {
                self.dispatch(
                    tx,
                    &DirectoryEvent::MembersAdded {
                        group: group.clone(),
                        user_ids: added.clone(),
                    },
                )?;
            }

            Ok(MembershipChange {
                group,
                user_ids: added,
            })
        })
    }

    /// Removes users from a group. Users that were not members are ignored.
    pub fn remove_members(
        &self,
        group_id: GroupId,
        user_ids: &[UserId],
    ) -> Result<MembershipChange, DirectoryError> {
        self.store.atomically(|tx| {
            let group = Self::require_group(tx, group_id)?;
            let mut removed = Vec::new();
            for user_id in unique(user_ids) {
                Self::require_user(tx, user_id)?;
                if tx.remove_member(group_id, user_id)? {
                    removed.push(user_id);
                }
            }

            if !removed.is_empty() {
                self.dispatch(
                    tx,
                    &DirectoryEvent::MembersRemoved {
                        group: group.clone(),
                        user_ids: removed.clone(),
                    },
                )?;
            }

            Ok(MembershipChange {
                group,
                user_ids: removed,
            })
        })
    }

    pub fn grant_permissions(
        &self,
        group_id: GroupId,
        permission_ids: &[PermissionId],
    ) -> Result<PermissionChange, DirectoryError> {
        self.store.atomically(|tx| {
            let group = Self::require_group(tx, group_id)?;
            let mut granted = Vec::new();
            for permission_id in unique(permission_ids) {
                Self::require_permission(tx, permission_id)?;
                if tx.grant_permission(group_id, permission_id)? {
                    granted.push(permission_id);
                }
            }

            if !granted.is_empty() {
                self.dispatch(
                    tx,
                    &DirectoryEvent::PermissionsGranted {
                        group: group.clone(),
                        permission_ids: granted.clone(),
                    },
                )?;
            }

            Ok(PermissionChange {
                group,
                permission_ids: granted,
            })
        })
    }

    pub fn revoke_permissions(
        &self,
        group_id: GroupId,
        permission_ids: &[PermissionId],
    ) -> Result<PermissionChange, DirectoryError> {
        self.store.atomically(|tx| {
            let group = Self::require_group(tx, group_id)?;
            let mut revoked = Vec::new();
            for permission_id in unique(permission_ids) {
                Self::require_permission(tx, permission_id)?;
                if tx.revoke_permission(group_id, permission_id)? {
                    revoked.push(permission_id);
                }
            }

            if !revoked.is_empty() {
                self.dispatch(
                    tx,
                    &DirectoryEvent::PermissionsRevoked {
                        group: group.clone(),
                        permission_ids: revoked.clone(),
                    },
                )?;
            }

            Ok(PermissionChange {
                group,
                permission_ids: revoked,
            })
        })
    }

    /// Runs the handlers for an event raised outside this directory, e.g. by
    /// an external identity provider that already applied the change.
    pub fn publish(&self, event: DirectoryEvent) -> Result<(), DirectoryError> {
        self.store.atomically(|tx| self.dispatch(tx, &event))
    }

    pub fn user(&self, user_id: UserId) -> Result<User, DirectoryError> {
        self.store.read(|tx| Self::require_user(tx, user_id))
    }

    pub fn user_groups(&self, user_id: UserId) -> Result<Vec<Group>, DirectoryError> {
        self.store.read(|tx| {
            Self::require_user(tx, user_id)?;
            Ok(tx.groups_for_user(user_id)?)
        })
    }

    pub fn group_history(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<GroupHistoryEntry>, DirectoryError> {
        self.store.read(|tx| {
            Self::require_group(tx, group_id)?;
            Ok(tx.history(group_id)?)
        })
    }

    pub fn profile(&self, user_id: UserId) -> Result<UserProfile, DirectoryError> {
        self.store.read(|tx| {
            tx.profile(user_id)?
                .ok_or(DirectoryError::not_found("profile", user_id.0))
        })
    }

    pub fn group_extension(&self, group_id: GroupId) -> Result<GroupExtension, DirectoryError> {
        self.store.read(|tx| {
            tx.group_extension(group_id)?
                .ok_or(DirectoryError::not_found("group extension", group_id.0))
        })
    }

    fn dispatch(&self, tx: &mut S::Tx, event: &DirectoryEvent) -> Result<(), DirectoryError> {
        for handler in &self.handlers {
            handler
                .handle(tx, event)
                .map_err(|source| DirectoryError::Handler {
                    handler: handler.name(),
                    event: event.kind(),
                    source,
                })?;
        }
        Ok(())
    }

    fn require_group(tx: &S::Tx, group_id: GroupId) -> Result<Group, DirectoryError> {
        tx.group(group_id)?
            .ok_or(DirectoryError::not_found("group", group_id.0))
    }

    fn require_user(tx: &S::Tx, user_id: UserId) -> Result<User, DirectoryError> {
        tx.user(user_id)?
            .ok_or(DirectoryError::not_found("user", user_id.0))
    }

    fn require_permission(
        tx: &S::Tx,
        permission_id: PermissionId,
    ) -> Result<Permission, DirectoryError> {
        tx.permission(permission_id)?
            .ok_or(DirectoryError::not_found("permission", permission_id.0))
    }
}

fn unique<T: Copy + Ord>(ids: &[T]) -> BTreeSet<T> {
    ids.iter().copied().collect()
}

/// Error raised by directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error("handler '{handler}' failed on {event}: {source}")]
    Handler {
        handler: &'static str,
        event: &'static str,
        #[source]
        source: RepositoryError,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl DirectoryError {
    pub(crate) fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}
