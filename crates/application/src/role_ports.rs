use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rolegrid_core::{AppResult, RoleId};
use rolegrid_domain::{AuditAction, PermissionTree, RolePermissions, TreeSnapshot};

/// Persisted role row as seen by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Marks roles scoped to manufacturing staff.
    #[serde(default)]
    pub is_manufacturing_role: bool,
    /// Last saved granular tree, absent for roles never edited in the tree editor.
    #[serde(default)]
    pub stored_tree: Option<TreeSnapshot>,
    /// Flat codes the role is currently granted.
    #[serde(default)]
    pub effective_codes: Vec<String>,
    /// Last modification timestamp.
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Marks roles scoped to manufacturing staff.
    pub is_manufacturing_role: bool,
    /// Initial grants; a blank baseline is used when absent.
    pub tree: Option<PermissionTree>,
}

/// Editable role metadata, written apart from the permission tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDetails {
    /// Unique role name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Marks roles scoped to manufacturing staff.
    pub is_manufacturing_role: bool,
}

/// Repository port for role storage.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds one role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleRecord>>;

    /// Lists all roles ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>>;

    /// Persists a new role. Fails with a conflict when the name is taken.
    async fn create_role(&self, role: RoleRecord) -> AppResult<RoleRecord>;

    /// Replaces the stored tree and derived codes of a role in one write.
    async fn save_role_permissions(
        &self,
        role_id: RoleId,
        permissions: RolePermissions,
    ) -> AppResult<RoleRecord>;

    /// Replaces a role's metadata. Fails with a conflict when another role
    /// already uses the new name.
    async fn update_role_details(
        &self,
        role_id: RoleId,
        details: RoleDetails,
    ) -> AppResult<RoleRecord>;

    /// Removes a role and returns the removed record.
    async fn delete_role(&self, role_id: RoleId) -> AppResult<RoleRecord>;
}

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Resource type label.
    pub resource_type: String,
    /// Resource identifier.
    pub resource_id: String,
    /// Optional audit detail payload.
    pub detail: Option<String>,
}

/// Port for persisting append-only audit events.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit event.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}
