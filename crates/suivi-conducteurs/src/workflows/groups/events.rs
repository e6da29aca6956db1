use serde::Serialize;

use super::domain::{Group, PermissionId, UserId};
use crate::store::RepositoryError;

/// Change raised by the directory after a mutation has been staged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DirectoryEvent {
    UserSaved {
        user_id: UserId,
        created: bool,
    },
    GroupCreated {
        group: Group,
    },
    MembersAdded {
        group: Group,
        user_ids: Vec<UserId>,
    },
    MembersRemoved {
        group: Group,
        user_ids: Vec<UserId>,
    },
    PermissionsGranted {
        group: Group,
        permission_ids: Vec<PermissionId>,
    },
    PermissionsRevoked {
        group: Group,
        permission_ids: Vec<PermissionId>,
    },
    GroupDeleted {
        group: Group,
    },
}

impl DirectoryEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            DirectoryEvent::UserSaved { .. } => "user_saved",
            DirectoryEvent::GroupCreated { .. } => "group_created",
            DirectoryEvent::MembersAdded { .. } => "members_added",
            DirectoryEvent::MembersRemoved { .. } => "members_removed",
            DirectoryEvent::PermissionsGranted { .. } => "permissions_granted",
            DirectoryEvent::PermissionsRevoked { .. } => "permissions_revoked",
            DirectoryEvent::GroupDeleted { .. } => "group_deleted",
        }
    }
}

/// Reaction to directory changes, run inside the transaction that made them.
///
/// Returning an error aborts the whole transaction, including the mutation
/// that raised the event.
pub trait DirectoryEventHandler<Tx>: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, tx: &mut Tx, event: &DirectoryEvent) -> Result<(), RepositoryError>;
}
