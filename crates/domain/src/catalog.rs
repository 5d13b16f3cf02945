//! Immutable permission schema: modules, their ordered items, and the actions
//! and parent/child shape of each item.
//!
//! Items are stored in one flat arena per module. Trees index into the same
//! arenas, so lookups by key resolve once to an item slot and everything
//! after that is positional.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{ActionSet, PermissionAction, PermissionKey, PermissionTreeError};

/// Structural role of an item inside its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemRole {
    /// Collapsible row owning child items.
    Parent,
    /// Row nested under a parent item of the same module.
    Child {
        /// Key of the owning parent item.
        parent_key: PermissionKey,
    },
    /// Row with no parent and no children.
    Standalone,
}

impl ItemRole {
    /// Returns the serialized role tag.
    #[must_use]
    pub fn kind(&self) -> ItemRoleKind {
        match self {
            Self::Parent => ItemRoleKind::Parent,
            Self::Child { .. } => ItemRoleKind::Child,
            Self::Standalone => ItemRoleKind::Standalone,
        }
    }
}

/// Role tag used by catalog documents and persisted snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRoleKind {
    /// See [`ItemRole::Parent`].
    Parent,
    /// See [`ItemRole::Child`].
    Child,
    /// See [`ItemRole::Standalone`].
    Standalone,
}

/// Serialized catalog as supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Modules in display order.
    pub modules: Vec<ModuleDocument>,
}

/// Serialized module entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDocument {
    /// Identifier-safe module key.
    pub key: String,
    /// Label shown in the role editor.
    pub display_name: String,
    /// Items in display order.
    #[serde(default)]
    pub items: Vec<ItemDocument>,
    /// Informational notes shown under the module. Never evaluated.
    #[serde(default)]
    pub additional_permissions: Vec<String>,
}

impl ModuleDocument {
    /// Creates a module document with no additional permission notes.
    #[must_use]
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        items: Vec<ItemDocument>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            items,
            additional_permissions: Vec::new(),
        }
    }
}

/// Serialized item entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDocument {
    /// Identifier-safe item key, unique within the module.
    pub key: String,
    /// Label shown in the role editor. Defaults to the key.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Actions this item exposes.
    pub supported_actions: Vec<PermissionAction>,
    /// Structural role.
    pub role: ItemRoleKind,
    /// Owning parent key, required for child items only.
    #[serde(default)]
    pub parent_key: Option<String>,
}

impl ItemDocument {
    /// Creates a parent item document.
    #[must_use]
    pub fn parent(
        key: impl Into<String>,
        display_name: impl Into<String>,
        supported_actions: &[PermissionAction],
    ) -> Self {
        Self::with_role(key, display_name, supported_actions, ItemRoleKind::Parent, None)
    }

    /// Creates a child item document.
    #[must_use]
    pub fn child(
        key: impl Into<String>,
        display_name: impl Into<String>,
        parent_key: impl Into<String>,
        supported_actions: &[PermissionAction],
    ) -> Self {
        Self::with_role(
            key,
            display_name,
            supported_actions,
            ItemRoleKind::Child,
            Some(parent_key.into()),
        )
    }

    /// Creates a standalone item document.
    #[must_use]
    pub fn standalone(
        key: impl Into<String>,
        display_name: impl Into<String>,
        supported_actions: &[PermissionAction],
    ) -> Self {
        Self::with_role(
            key,
            display_name,
            supported_actions,
            ItemRoleKind::Standalone,
            None,
        )
    }

    fn with_role(
        key: impl Into<String>,
        display_name: impl Into<String>,
        supported_actions: &[PermissionAction],
        role: ItemRoleKind,
        parent_key: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: Some(display_name.into()),
            supported_actions: supported_actions.to_vec(),
            role,
            parent_key,
        }
    }
}

/// One validated catalog row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    key: PermissionKey,
    display_name: String,
    supported_actions: ActionSet,
    role: ItemRole,
}

impl CatalogItem {
    /// Returns the item key.
    #[must_use]
    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    /// Returns the display label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the actions this item exposes.
    #[must_use]
    pub fn supported_actions(&self) -> ActionSet {
        self.supported_actions
    }

    /// Returns whether the item exposes `action`.
    #[must_use]
    pub fn supports(&self, action: PermissionAction) -> bool {
        self.supported_actions.contains(action)
    }

    /// Returns the structural role.
    #[must_use]
    pub fn role(&self) -> &ItemRole {
        &self.role
    }

    /// Returns the owning parent key for child items.
    #[must_use]
    pub fn parent_key(&self) -> Option<&PermissionKey> {
        match &self.role {
            ItemRole::Child { parent_key } => Some(parent_key),
            ItemRole::Parent | ItemRole::Standalone => None,
        }
    }
}

/// One validated catalog module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogModule {
    key: PermissionKey,
    display_name: String,
    items: Vec<CatalogItem>,
    additional_permissions: Vec<String>,
    item_index: HashMap<PermissionKey, usize>,
    children: Vec<Vec<usize>>,
    parents: Vec<Option<usize>>,
}

impl CatalogModule {
    /// Returns the module key.
    #[must_use]
    pub fn key(&self) -> &PermissionKey {
        &self.key
    }

    /// Returns the display label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns items in display order.
    #[must_use]
    pub fn items(&self) -> &[CatalogItem] {
        self.items.as_slice()
    }

    /// Returns an item by key.
    #[must_use]
    pub fn item(&self, item_key: &str) -> Option<&CatalogItem> {
        self.item_position(item_key)
            .and_then(|position| self.items.get(position))
    }

    /// Returns the informational notes attached to this module.
    #[must_use]
    pub fn additional_permissions(&self) -> &[String] {
        self.additional_permissions.as_slice()
    }

    /// Returns the children of `parent_key` in display order.
    #[must_use]
    pub fn children_of(&self, parent_key: &str) -> Vec<&CatalogItem> {
        self.item_position(parent_key)
            .map(|position| {
                self.child_positions(position)
                    .iter()
                    .filter_map(|child| self.items.get(*child))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the actions supported by at least one item, in canonical order.
    ///
    /// The role editor renders one column per returned action.
    #[must_use]
    pub fn action_columns(&self) -> Vec<PermissionAction> {
        let supported = self
            .items
            .iter()
            .fold(ActionSet::empty(), |acc, item| acc.union(item.supported_actions));
        supported.iter().collect()
    }

    pub(crate) fn item_position(&self, item_key: &str) -> Option<usize> {
        self.item_index.get(item_key).copied()
    }

    pub(crate) fn child_positions(&self, position: usize) -> &[usize] {
        self.children
            .get(position)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn parent_position(&self, position: usize) -> Option<usize> {
        self.parents.get(position).copied().flatten()
    }

    pub(crate) fn parent_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(position, item)| {
                matches!(item.role, ItemRole::Parent).then_some(position)
            })
    }

    fn from_document(document: ModuleDocument) -> Result<Self, PermissionTreeError> {
        let key = PermissionKey::new(document.key)?;
        let mut items = Vec::with_capacity(document.items.len());
        let mut item_index = HashMap::with_capacity(document.items.len());

        for item in document.items {
            let item_key = PermissionKey::new(item.key)?;
            if item_index.contains_key(item_key.as_str()) {
                return Err(PermissionTreeError::DuplicateKey(format!("{key}.{item_key}")));
            }

            let role = match (item.role, item.parent_key) {
                (ItemRoleKind::Child, Some(parent_key)) => ItemRole::Child {
                    parent_key: PermissionKey::new(parent_key)?,
                },
                (ItemRoleKind::Child, None) => {
                    return Err(shape_mismatch(&key, &item_key, "child item has no parent key"));
                }
                (ItemRoleKind::Parent | ItemRoleKind::Standalone, Some(parent_key)) => {
                    return Err(shape_mismatch(
                        &key,
                        &item_key,
                        format!("only child items may reference a parent, found '{parent_key}'"),
                    ));
                }
                (ItemRoleKind::Parent, None) => ItemRole::Parent,
                (ItemRoleKind::Standalone, None) => ItemRole::Standalone,
            };

            item_index.insert(item_key.clone(), items.len());
            items.push(CatalogItem {
                display_name: item.display_name.unwrap_or_else(|| item_key.to_string()),
                key: item_key,
                supported_actions: item.supported_actions.into_iter().collect(),
                role,
            });
        }

        let mut children = vec![Vec::new(); items.len()];
        let mut parents = vec![None; items.len()];
        for (position, item) in items.iter().enumerate() {
            let Some(parent_key) = item.parent_key() else {
                continue;
            };

            let parent_position = item_index
                .get(parent_key.as_str())
                .copied()
                .filter(|candidate| matches!(items[*candidate].role, ItemRole::Parent))
                .ok_or_else(|| {
                    shape_mismatch(
                        &key,
                        &item.key,
                        format!("parent '{parent_key}' is not a parent item of this module"),
                    )
                })?;

            children[parent_position].push(position);
            parents[position] = Some(parent_position);
        }

        Ok(Self {
            key,
            display_name: document.display_name,
            items,
            additional_permissions: document.additional_permissions,
            item_index,
            children,
            parents,
        })
    }
}

fn shape_mismatch(
    module_key: &PermissionKey,
    item_key: &PermissionKey,
    detail: impl Into<String>,
) -> PermissionTreeError {
    PermissionTreeError::CatalogShapeMismatch {
        module_key: module_key.to_string(),
        item_key: item_key.to_string(),
        detail: detail.into(),
    }
}

/// Position of one item inside a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ItemSlot {
    pub(crate) module: usize,
    pub(crate) item: usize,
}

/// The validated, process-wide permission schema.
///
/// Integrity is checked once in [`PermissionCatalog::from_document`]; every
/// tree built from a catalog can rely on parent references resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCatalog {
    modules: Vec<CatalogModule>,
    module_index: HashMap<PermissionKey, usize>,
}

impl PermissionCatalog {
    /// Validates a catalog document.
    pub fn from_document(document: CatalogDocument) -> Result<Self, PermissionTreeError> {
        let mut modules = Vec::with_capacity(document.modules.len());
        let mut module_index = HashMap::with_capacity(document.modules.len());

        for module in document.modules {
            let module = CatalogModule::from_document(module)?;
            if module_index.contains_key(module.key.as_str()) {
                return Err(PermissionTreeError::DuplicateKey(module.key.to_string()));
            }

            module_index.insert(module.key.clone(), modules.len());
            modules.push(module);
        }

        Ok(Self {
            modules,
            module_index,
        })
    }

    /// Returns modules in display order.
    #[must_use]
    pub fn modules(&self) -> &[CatalogModule] {
        self.modules.as_slice()
    }

    /// Returns a module by key.
    #[must_use]
    pub fn module(&self, module_key: &str) -> Option<&CatalogModule> {
        self.module_position(module_key)
            .and_then(|position| self.modules.get(position))
    }

    /// Returns an item by module and item key.
    #[must_use]
    pub fn item(&self, module_key: &str, item_key: &str) -> Option<&CatalogItem> {
        self.module(module_key)
            .and_then(|module| module.item(item_key))
    }

    /// Returns the total number of items across modules.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.modules.iter().map(|module| module.items.len()).sum()
    }

    pub(crate) fn module_position(&self, module_key: &str) -> Option<usize> {
        self.module_index.get(module_key).copied()
    }

    pub(crate) fn slot(&self, module_key: &str, item_key: &str) -> Option<ItemSlot> {
        let module = self.module_position(module_key)?;
        let item = self.modules.get(module)?.item_position(item_key)?;
        Some(ItemSlot { module, item })
    }
}
