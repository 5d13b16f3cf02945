use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use rolegrid_core::{Actor, AppError, AppResult, NonEmptyString, RoleId};
use rolegrid_domain::{AuditAction, PermissionCatalog, PermissionTree, RolePermissions, reconcile};

use crate::{
    AuditEvent, AuditRepository, CreateRoleInput, RoleDetails, RoleRecord, RoleRepository,
};

mod session;


pub use session::RoleEditSession;

const ROLE_RESOURCE_TYPE: &str = "role";

/// Application service for loading, editing and saving role permission trees.
///
/// Audit events are appended after the role write has committed. A failed
/// append is logged and does not turn a completed write into an error.
#[derive(Clone)]
pub struct RoleEditorService {
    catalog: Arc<PermissionCatalog>,
    repository: Arc<dyn RoleRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleEditorService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        catalog: Arc<PermissionCatalog>,
        repository: Arc<dyn RoleRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            catalog,
            repository,
            audit_repository,
        }
    }

    /// Returns the catalog trees are shaped by.
    #[must_use]
    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        &self.catalog
    }

    /// Lists roles ordered by name.
    pub async fn list_roles(&self) -> AppResult<Vec<RoleRecord>> {
        self.repository.list_roles().await
    }

    /// Returns one role record.
    pub async fn role(&self, role_id: RoleId) -> AppResult<RoleRecord> {
        self.require_role(role_id).await
    }

    /// Loads a role and reconciles its stored tree with its effective codes.
    pub async fn open_session(&self, role_id: RoleId) -> AppResult<RoleEditSession> {
        let role = self.require_role(role_id).await?;
        let tree = self.load_tree(&role);

        debug!(
            role_id = %role.role_id,
            has_stored_tree = role.stored_tree.is_some(),
            effective_code_count = role.effective_codes.len(),
            "opened role edit session"
        );

        Ok(RoleEditSession::open(role.role_id, role.name, tree))
    }

    /// Persists the session's tree together with its derived codes.
    pub async fn save_session(
        &self,
        actor: &Actor,
        session: &mut RoleEditSession,
    ) -> AppResult<RoleRecord> {
        let permissions = session.permissions();
        let code_count = permissions.codes().len();

        let role = self
            .repository
            .save_role_permissions(session.role_id(), permissions)
            .await?;
        session.mark_saved();

        self.record_event(
            actor,
            AuditAction::RolePermissionsUpdated,
            role.role_id,
            format!(
                "saved {code_count} permission codes for role '{}'",
                role.name
            ),
        )
        .await;

        info!(role_id = %role.role_id, code_count, "saved role permissions");
        Ok(role)
    }

    /// Creates a role, deriving its codes from the initial tree.
    pub async fn create_role(
        &self,
        actor: &Actor,
        input: CreateRoleInput,
    ) -> AppResult<RoleRecord> {
        let name = NonEmptyString::new(input.name.trim())?;
        let tree = match input.tree {
            Some(tree) => {
                self.require_catalog_shape(&tree)?;
                tree
            }
            None => PermissionTree::baseline(Arc::clone(&self.catalog)),
        };

        let role = self
            .repository
            .create_role(new_record(
                name.into(),
                input.description,
                input.is_manufacturing_role,
                &tree,
            ))
            .await?;

        self.record_event(
            actor,
            AuditAction::RoleCreated,
            role.role_id,
            format!("created role '{}'", role.name),
        )
        .await;

        info!(role_id = %role.role_id, name = %role.name, "created role");
        Ok(role)
    }

    /// Copies a role's reconciled tree into a new role named after the source.
    ///
    /// The copy is named `"<source> (Copy)"`, then `"<source> (Copy 2)"` and
    /// so on until the name is free.
    pub async fn clone_role(&self, actor: &Actor, source_role_id: RoleId) -> AppResult<RoleRecord> {
        let source = self.require_role(source_role_id).await?;
        let tree = self.load_tree(&source);

        let taken: Vec<String> = self
            .repository
            .list_roles()
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect();
        let name = copy_name(source.name.as_str(), &taken);

        let role = self
            .repository
            .create_role(new_record(
                name,
                source.description.clone(),
                source.is_manufacturing_role,
                &tree,
            ))
            .await?;

        self.record_event(
            actor,
            AuditAction::RoleCloned,
            role.role_id,
            format!(
                "cloned role '{}' ({}) as '{}'",
                source.name, source.role_id, role.name
            ),
        )
        .await;

        info!(
            source_role_id = %source.role_id,
            role_id = %role.role_id,
            name = %role.name,
            "cloned role"
        );
        Ok(role)
    }

    /// Renames a role or changes its description and manufacturing flag.
    ///
    /// The permission tree and codes are left as they are.
    pub async fn update_role_details(
        &self,
        actor: &Actor,
        role_id: RoleId,
        details: RoleDetails,
    ) -> AppResult<RoleRecord> {
        let name = NonEmptyString::new(details.name.trim())?;
        let details = RoleDetails {
            name: name.into(),
            description: details
                .description
                .map(|description| description.trim().to_owned())
                .filter(|description| !description.is_empty()),
            is_manufacturing_role: details.is_manufacturing_role,
        };

        let previous = self.require_role(role_id).await?;
        let role = self.repository.update_role_details(role_id, details).await?;

        self.record_event(
            actor,
            AuditAction::RoleUpdated,
            role.role_id,
            format!(
                "updated role '{}' (was '{}', manufacturing: {})",
                role.name, previous.name, role.is_manufacturing_role
            ),
        )
        .await;

        info!(role_id = %role.role_id, name = %role.name, "updated role details");
        Ok(role)
    }

    /// Deletes a role.
    pub async fn delete_role(&self, actor: &Actor, role_id: RoleId) -> AppResult<RoleRecord> {
        let role = self.repository.delete_role(role_id).await?;

        self.record_event(
            actor,
            AuditAction::RoleDeleted,
            role.role_id,
            format!("deleted role '{}'", role.name),
        )
        .await;

        info!(role_id = %role.role_id, name = %role.name, "deleted role");
        Ok(role)
    }

    async fn record_event(
        &self,
        actor: &Actor,
        action: AuditAction,
        role_id: RoleId,
        detail: String,
    ) {
        let event = AuditEvent {
            subject: actor.subject().to_owned(),
            action,
            resource_type: ROLE_RESOURCE_TYPE.to_owned(),
            resource_id: role_id.to_string(),
            detail: Some(format!("{detail} by {}", actor.display_name())),
        };

        if let Err(error) = self.audit_repository.append_event(event).await {
            warn!(
                action = action.as_str(),
                role_id = %role_id,
                %error,
                "failed to append audit event"
            );
        }
    }

    async fn require_role(&self, role_id: RoleId) -> AppResult<RoleRecord> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    fn load_tree(&self, role: &RoleRecord) -> PermissionTree {
        reconcile(
            &self.catalog,
            role.stored_tree.as_ref(),
            role.effective_codes.iter(),
        )
    }

    fn require_catalog_shape(&self, tree: &PermissionTree) -> AppResult<()> {
        if Arc::ptr_eq(tree.catalog(), &self.catalog) || tree.catalog() == &self.catalog {
            return Ok(());
        }

        Err(AppError::Validation(
            "initial role tree was built from a different permission catalog".to_owned(),
        ))
    }
}

fn new_record(
    name: String,
    description: Option<String>,
    is_manufacturing_role: bool,
    tree: &PermissionTree,
) -> RoleRecord {
    let permissions = RolePermissions::from_tree(tree);
    let effective_codes = permissions.code_strings();
    let (stored_tree, _) = permissions.into_parts();

    RoleRecord {
        role_id: RoleId::new(),
        name,
        description,
        is_manufacturing_role,
        stored_tree: Some(stored_tree),
        effective_codes,
        updated_at: Utc::now(),
    }
}

fn copy_name(source_name: &str, taken: &[String]) -> String {
    let is_taken = |candidate: &str| taken.iter().any(|name| name == candidate);

    let mut candidate = format!("{source_name} (Copy)");
    let mut counter = 1_u32;
    while is_taken(candidate.as_str()) {
        counter += 1;
        candidate = format!("{source_name} (Copy {counter})");
    }

    candidate
}
