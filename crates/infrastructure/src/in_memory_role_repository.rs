use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rolegrid_application::{RoleDetails, RoleRecord, RoleRepository};
use rolegrid_core::{AppError, AppResult, RoleId};
use rolegrid_domain::RolePermissions;
use tokio::sync::RwLock;
use tracing::debug;


/// In-memory role repository implementation.
///
/// Stores no inheritance model, so a role's effective codes are exactly the
/// codes last saved for it.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    roles: RwLock<HashMap<RoleId, RoleRecord>>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `roles`.
    pub fn seeded(roles: impl IntoIterator<Item = RoleRecord>) -> AppResult<Self> {
        let mut stored: HashMap<RoleId, RoleRecord> = HashMap::new();
        for role in roles {
            ensure_unique(&stored, &role)?;
            stored.insert(role.role_id, role);
        }

        debug!(role_count = stored.len(), "seeded in-memory role repository");
        Ok(Self {
            roles: RwLock::new(stored),
        })
    }
}

fn ensure_unique(roles: &HashMap<RoleId, RoleRecord>, role: &RoleRecord) -> AppResult<()> {
    if roles.contains_key(&role.role_id) {
        return Err(AppError::Conflict(format!(
            "role id '{}' already exists",
            role.role_id
        )));
    }

    ensure_name_free(roles, role.name.as_str(), role.role_id)
}

fn ensure_name_free(
    roles: &HashMap<RoleId, RoleRecord>,
    name: &str,
    owner: RoleId,
) -> AppResult<()> {
    if roles
        .values()
        .any(|existing| existing.role_id != owner && existing.name == name)
    {
        return Err(AppError::Conflict(format!("role '{name}' already exists")));
    }

    Ok(())
}

fn missing_role(role_id: RoleId) -> AppError {
    AppError::NotFound(format!("role '{role_id}' does not exist"))
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleRecord>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        let roles = self.roles.read().await;

        let mut values: Vec<RoleRecord> = roles.values().cloned().collect();
        values.sort_by(|left, right| left.name.cmp(&right.name));

        Ok(values)
    }

    async fn create_role(&self, role: RoleRecord) -> AppResult<RoleRecord> {
        let mut roles = self.roles.write().await;
        ensure_unique(&roles, &role)?;

        roles.insert(role.role_id, role.clone());
        Ok(role)
    }

    async fn save_role_permissions(
        &self,
        role_id: RoleId,
        permissions: RolePermissions,
    ) -> AppResult<RoleRecord> {
        let mut roles = self.roles.write().await;
        let role = roles.get_mut(&role_id).ok_or_else(|| missing_role(role_id))?;

        let effective_codes = permissions.code_strings();
        let (stored_tree, _) = permissions.into_parts();
        role.effective_codes = effective_codes;
        role.stored_tree = Some(stored_tree);
        role.updated_at = Utc::now();

        Ok(role.clone())
    }

    async fn update_role_details(
        &self,
        role_id: RoleId,
        details: RoleDetails,
    ) -> AppResult<RoleRecord> {
        let mut roles = self.roles.write().await;
        if !roles.contains_key(&role_id) {
            return Err(missing_role(role_id));
        }
        ensure_name_free(&roles, details.name.as_str(), role_id)?;

        let role = roles.get_mut(&role_id).ok_or_else(|| missing_role(role_id))?;
        role.name = details.name;
        role.description = details.description;
        role.is_manufacturing_role = details.is_manufacturing_role;
        role.updated_at = Utc::now();

        Ok(role.clone())
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<RoleRecord> {
        self.roles
            .write()
            .await
            .remove(&role_id)
            .ok_or_else(|| missing_role(role_id))
    }
}
