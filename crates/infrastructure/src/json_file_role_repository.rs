use std::path::PathBuf;

use async_trait::async_trait;
use rolegrid_application::{RoleDetails, RoleRecord, RoleRepository};
use rolegrid_core::{AppError, AppResult, RoleId};
use rolegrid_domain::RolePermissions;
use tokio::sync::Mutex;
use tracing::debug;

use crate::InMemoryRoleRepository;
use crate::json_role_file::{load_role_records_from_path, save_role_records_to_path};

/// Role repository kept in memory and written through to a JSON file.
///
/// Every successful write rewrites the whole file, so the file always holds
/// the same role list a fresh `open` would load.
#[derive(Debug)]
pub struct JsonFileRoleRepository {
    path: PathBuf,
    roles: InMemoryRoleRepository,
    writes: Mutex<()>,
}

impl JsonFileRoleRepository {
    /// Loads roles from `path`. A missing file starts an empty store that is
    /// created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let exists = tokio::fs::try_exists(&path).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to inspect role file '{}': {error}",
                path.display()
            ))
        })?;

        let roles = if exists {
            load_role_records_from_path(&path).await?
        } else {
            debug!(path = %path.display(), "role file missing, starting empty");
            Vec::new()
        };

        Ok(Self {
            roles: InMemoryRoleRepository::seeded(roles)?,
            path,
            writes: Mutex::new(()),
        })
    }

    async fn write_through(&self) -> AppResult<()> {
        let roles = self.roles.list_roles().await?;
        save_role_records_to_path(&self.path, &roles).await
    }
}

#[async_trait]
impl RoleRepository for JsonFileRoleRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<RoleRecord>> {
        self.roles.find_role(role_id).await
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        self.roles.list_roles().await
    }

    async fn create_role(&self, role: RoleRecord) -> AppResult<RoleRecord> {
        let _guard = self.writes.lock().await;
        let role = self.roles.create_role(role).await?;
        self.write_through().await?;
        Ok(role)
    }

    async fn save_role_permissions(
        &self,
        role_id: RoleId,
        permissions: RolePermissions,
    ) -> AppResult<RoleRecord> {
        let _guard = self.writes.lock().await;
        let role = self.roles.save_role_permissions(role_id, permissions).await?;
        self.write_through().await?;
        Ok(role)
    }

    async fn update_role_details(
        &self,
        role_id: RoleId,
        details: RoleDetails,
    ) -> AppResult<RoleRecord> {
        let _guard = self.writes.lock().await;
        let role = self.roles.update_role_details(role_id, details).await?;
        self.write_through().await?;
        Ok(role)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<RoleRecord> {
        let _guard = self.writes.lock().await;
        let role = self.roles.delete_role(role_id).await?;
        self.write_through().await?;
        Ok(role)
    }
}
