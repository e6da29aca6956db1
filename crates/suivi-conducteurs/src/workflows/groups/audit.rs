use tracing::{debug, info};

use super::domain::{Group, GroupAction, NewHistoryEntry, PermissionId, UserId};
use super::events::{DirectoryEvent, DirectoryEventHandler};
use super::repository::DirectoryRepository;
use crate::store::RepositoryError;

/// Writes one history row per membership or permission change.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditTrail;

impl AuditTrail {
    fn record_members<Tx: DirectoryRepository>(
        tx: &mut Tx,
        group: &Group,
        user_ids: &[UserId],
        action: GroupAction,
    ) -> Result<(), RepositoryError> {
        for &user_id in user_ids {
            let Some(user) = tx.user(user_id)? else {
                debug!(%user_id, group = %group.name, "skipping audit for unknown user");
                continue;
            };

            let details = match action {
                GroupAction::RemoveUser => {
                    format!("Retrait de {} du groupe {}", user.username, group.name)
                }
                _ => format!("Ajout de {} au groupe {}", user.username, group.name),
            };

            tx.record_history(NewHistoryEntry {
                group_id: group.id,
                action,
                target_user: Some(user_id),
                target_permission: None,
                details,
            })?;
        }
        Ok(())
    }

    fn record_permissions<Tx: DirectoryRepository>(
        tx: &mut Tx,
        group: &Group,
        permission_ids: &[PermissionId],
        action: GroupAction,
    ) -> Result<(), RepositoryError> {
        for &permission_id in permission_ids {
            let Some(permission) = tx.permission(permission_id)? else {
                debug!(%permission_id, group = %group.name, "skipping audit for unknown permission");
                continue;
            };

            let details = match action {
                GroupAction::RemovePermission => format!(
                    "Retrait de la permission {} du groupe {}",
                    permission.name, group.name
                ),
                _ => format!(
                    "Ajout de la permission {} au groupe {}",
                    permission.name, group.name
                ),
            };

            tx.record_history(NewHistoryEntry {
                group_id: group.id,
                action,
                target_user: None,
                target_permission: Some(permission_id),
                details,
            })?;
        }
        Ok(())
    }
}

impl<Tx: DirectoryRepository> DirectoryEventHandler<Tx> for AuditTrail {
    fn name(&self) -> &'static str {
        "audit-trail"
    }

    fn handle(&self, tx: &mut Tx, event: &DirectoryEvent) -> Result<(), RepositoryError> {
        match event {
            DirectoryEvent::MembersAdded { group, user_ids } => {
                Self::record_members(tx, group, user_ids, GroupAction::AddUser)
            }
            DirectoryEvent::MembersRemoved { group, user_ids } => {
                Self::record_members(tx, group, user_ids, GroupAction::RemoveUser)
            }
            DirectoryEvent::PermissionsGranted {
                group,
                permission_ids,
            } => Self::record_permissions(tx, group, permission_ids, GroupAction::AddPermission),
            DirectoryEvent::PermissionsRevoked {
                group,
                permission_ids,
            } => Self::record_permissions(
                tx,
                group,
                permission_ids,
                GroupAction::RemovePermission,
            ),
            // History rows cascade with the group, so deletion is only logged.
            DirectoryEvent::GroupDeleted { group } => {
                info!(group = %group.name, group_id = %group.id, "group deleted");
                Ok(())
            }
            DirectoryEvent::UserSaved { .. } | DirectoryEvent::GroupCreated { .. } => Ok(()),
        }
    }
}
