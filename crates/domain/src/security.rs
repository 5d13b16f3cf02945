use serde::{Deserialize, Serialize};

/// Stable audit actions emitted by role administration use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a role is created.
    RoleCreated,
    /// Emitted when a role is cloned from another role.
    RoleCloned,
    /// Emitted when a role's permission tree and codes are saved.
    RolePermissionsUpdated,
    /// Emitted when a role's name, description or manufacturing flag changes.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleCreated => "role.created",
            Self::RoleCloned => "role.cloned",
            Self::RolePermissionsUpdated => "role.permissions.updated",
            Self::RoleUpdated => "role.updated",
            Self::RoleDeleted => "role.deleted",
        }
    }
}
