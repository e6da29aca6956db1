use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

entity_id!(
    /// Identifier of an account in the directory.
    UserId
);
entity_id!(GroupId);
entity_id!(PermissionId);
entity_id!(HistoryEntryId);

/// Value stored in profile fields nobody has filled in yet.
pub const UNDEFINED_FIELD: &str = "Non défini";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
}

/// Payload used to register a new account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl NewUser {
    pub fn named(username: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_active: true,
        }
    }
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub codename: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPermission {
    pub codename: String,
    pub name: String,
}

/// Kind of change recorded in a group's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    AddUser,
    RemoveUser,
    AddPermission,
    RemovePermission,
}

impl GroupAction {
    pub const fn label(self) -> &'static str {
        match self {
            GroupAction::AddUser => "add_user",
            GroupAction::RemoveUser => "remove_user",
            GroupAction::AddPermission => "add_permission",
            GroupAction::RemovePermission => "remove_permission",
        }
    }
}

/// Audit row describing one membership or permission change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupHistoryEntry {
    pub id: HistoryEntryId,
    pub group_id: GroupId,
    pub action: GroupAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_permission: Option<PermissionId>,
    pub details: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub group_id: GroupId,
    pub action: GroupAction,
    pub target_user: Option<UserId>,
    pub target_permission: Option<PermissionId>,
    pub details: String,
}

/// Per-user HR metadata kept alongside the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub active: bool,
    pub service: String,
    pub position: String,
}

impl UserProfile {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            active: user.is_active,
            service: UNDEFINED_FIELD.to_string(),
            position: UNDEFINED_FIELD.to_string(),
        }
    }
}

/// Presentation and access metadata attached to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupExtension {
    pub group_id: GroupId,
    pub description: String,
    pub color: String,
    pub access_level: u8,
    pub active: bool,
}

impl GroupExtension {
    pub const DEFAULT_COLOR: &'static str = "#007bff";

    pub fn for_group(group: &Group) -> Self {
        Self {
            group_id: group.id,
            description: format!("Groupe {}", group.name),
            color: Self::DEFAULT_COLOR.to_string(),
            access_level: 1,
            active: true,
        }
    }
}

/// Outcome of a membership mutation: only users whose membership changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipChange {
    pub group: Group,
    pub user_ids: Vec<UserId>,
}

/// Outcome of a permission mutation: only permissions actually granted or revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionChange {
    pub group: Group,
    pub permission_ids: Vec<PermissionId>,
}

fn default_active() -> bool {
    true
}
