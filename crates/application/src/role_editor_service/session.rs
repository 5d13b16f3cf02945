use std::collections::{BTreeSet, HashSet};

use rolegrid_core::{AppError, AppResult, RoleId};
use rolegrid_domain::{
    ItemRole, PermissionAction, PermissionCode, PermissionTree, RolePermissions, apply_toggle,
    build_codes,
};

/// One administrator's in-progress edit of a role's permission tree.
///
/// The session owns its tree exclusively; every toggle replaces it with the
/// propagated result. Collapse state is presentation only and never feeds
/// into propagation.
#[derive(Debug, Clone)]
pub struct RoleEditSession {
    role_id: RoleId,
    role_name: String,
    loaded: PermissionTree,
    tree: PermissionTree,
    collapsed: HashSet<(String, String)>,
}

impl RoleEditSession {
    pub(crate) fn open(role_id: RoleId, role_name: String, tree: PermissionTree) -> Self {
        let collapsed = tree
            .catalog()
            .modules()
            .iter()
            .flat_map(|module| {
                module
                    .items()
                    .iter()
                    .filter(|item| matches!(item.role(), ItemRole::Parent))
                    .map(move |item| (module.key().to_string(), item.key().to_string()))
            })
            .collect();

        Self {
            role_id,
            role_name,
            loaded: tree.clone(),
            tree,
            collapsed,
        }
    }

    /// Returns the edited role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the edited role name.
    #[must_use]
    pub fn role_name(&self) -> &str {
        self.role_name.as_str()
    }

    /// Returns the current tree.
    #[must_use]
    pub fn tree(&self) -> &PermissionTree {
        &self.tree
    }

    /// Returns the codes the current tree would persist.
    #[must_use]
    pub fn codes(&self) -> BTreeSet<PermissionCode> {
        build_codes(&self.tree)
    }

    /// Returns whether the tree differs from what was loaded.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.tree != self.loaded
    }

    /// Sets one action on one item and propagates the edit.
    pub fn toggle(
        &mut self,
        module_key: &str,
        item_key: &str,
        action: PermissionAction,
        value: bool,
    ) -> AppResult<()> {
        self.tree = apply_toggle(&self.tree, module_key, item_key, action, value)?;
        Ok(())
    }

    /// Discards unsaved edits.
    pub fn reset(&mut self) {
        self.tree = self.loaded.clone();
    }

    /// Flips the collapsed flag of a parent row and returns the new state.
    pub fn toggle_collapsed(&mut self, module_key: &str, item_key: &str) -> AppResult<bool> {
        let item = self
            .tree
            .catalog()
            .item(module_key, item_key)
            .ok_or_else(|| {
                AppError::NotFound(format!("unknown permission item '{module_key}.{item_key}'"))
            })?;
        if !matches!(item.role(), ItemRole::Parent) {
            return Err(AppError::Validation(format!(
                "only parent items can be collapsed, '{module_key}.{item_key}' is not a parent"
            )));
        }

        let row = (module_key.to_owned(), item_key.to_owned());
        if self.collapsed.remove(&row) {
            return Ok(false);
        }

        self.collapsed.insert(row);
        Ok(true)
    }

    /// Returns whether a parent row is collapsed. Non-parent rows never are.
    #[must_use]
    pub fn is_collapsed(&self, module_key: &str, item_key: &str) -> bool {
        self.collapsed
            .contains(&(module_key.to_owned(), item_key.to_owned()))
    }

    pub(crate) fn permissions(&self) -> RolePermissions {
        RolePermissions::from_tree(&self.tree)
    }

    pub(crate) fn mark_saved(&mut self) {
        self.loaded = self.tree.clone();
    }
}
