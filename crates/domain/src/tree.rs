use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogModule, ItemSlot};
use crate::{ActionSet, ItemRoleKind, PermissionAction, PermissionCatalog, PermissionKey};

/// Live permission state shaped like a [`PermissionCatalog`].
///
/// Values are held per module in shared arenas. Cloning a tree is a handful of
/// reference-count bumps; an edit copies only the arena of the module it
/// touches.
#[derive(Debug, Clone)]
pub struct PermissionTree {
    catalog: Arc<PermissionCatalog>,
    modules: Vec<Arc<Vec<ActionSet>>>,
}

impl PermissionTree {
    /// Creates the clean baseline: every action on every item is false.
    #[must_use]
    pub fn baseline(catalog: Arc<PermissionCatalog>) -> Self {
        let modules = catalog
            .modules()
            .iter()
            .map(|module| Arc::new(vec![ActionSet::empty(); module.items().len()]))
            .collect();

        Self { catalog, modules }
    }

    /// Returns the catalog this tree is shaped by.
    #[must_use]
    pub fn catalog(&self) -> &Arc<PermissionCatalog> {
        &self.catalog
    }

    /// Returns the value of one action, or `None` when the item is unknown or
    /// does not support the action.
    #[must_use]
    pub fn value(
        &self,
        module_key: &str,
        item_key: &str,
        action: PermissionAction,
    ) -> Option<bool> {
        let slot = self.catalog.slot(module_key, item_key)?;
        let item = self.catalog.modules().get(slot.module)?.items().get(slot.item)?;
        item.supports(action)
            .then(|| self.values_at(slot).contains(action))
    }

    /// Returns the granted actions of one item.
    #[must_use]
    pub fn granted(&self, module_key: &str, item_key: &str) -> Option<ActionSet> {
        self.catalog
            .slot(module_key, item_key)
            .map(|slot| self.values_at(slot))
    }

    /// Iterates every granted `(module, item, action)` triple in catalog order.
    pub fn granted_triples(
        &self,
    ) -> impl Iterator<Item = (&PermissionKey, &PermissionKey, PermissionAction)> + '_ {
        self.catalog
            .modules()
            .iter()
            .zip(self.modules.iter())
            .flat_map(|(module, values)| {
                module
                    .items()
                    .iter()
                    .zip(values.iter())
                    .flat_map(move |(item, granted)| {
                        granted
                            .iter()
                            .map(move |action| (module.key(), item.key(), action))
                    })
            })
    }

    /// Returns whether no action is granted anywhere.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.modules
            .iter()
            .all(|values| values.iter().all(|granted| granted.is_empty()))
    }

    /// Returns a copy in which every parent's flags are recomputed from its
    /// children.
    ///
    /// For each action a parent supports, the parent is granted the action
    /// exactly when every child supporting it is granted it. Actions no child
    /// supports keep the parent's current value.
    #[must_use]
    pub fn recompute_parents(&self) -> Self {
        let mut next = self.clone();
        next.recompute_parents_in_place();
        next
    }

    /// Serializes the tree into its persisted form.
    #[must_use]
    pub fn to_snapshot(&self) -> TreeSnapshot {
        let modules = self
            .catalog
            .modules()
            .iter()
            .zip(self.modules.iter())
            .map(|(module, values)| {
                let items = module
                    .items()
                    .iter()
                    .zip(values.iter())
                    .map(|(item, granted)| {
                        let actions = item
                            .supported_actions()
                            .iter()
                            .map(|action| (action.as_str().to_owned(), granted.contains(action)))
                            .collect();
                        let snapshot = ItemSnapshot {
                            actions,
                            role: Some(item.role().kind()),
                            parent_key: item.parent_key().map(ToString::to_string),
                        };
                        (item.key().to_string(), snapshot)
                    })
                    .collect();

                let snapshot = ModuleSnapshot {
                    display_name: Some(module.display_name().to_owned()),
                    items,
                };
                (module.key().to_string(), snapshot)
            })
            .collect();

        TreeSnapshot { modules }
    }

    pub(crate) fn values_at(&self, slot: ItemSlot) -> ActionSet {
        self.modules
            .get(slot.module)
            .and_then(|values| values.get(slot.item))
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn set_values(&mut self, slot: ItemSlot, granted: ActionSet) {
        if let Some(values) = self.modules.get_mut(slot.module)
            && let Some(current) = Arc::make_mut(values).get_mut(slot.item)
        {
            *current = granted;
        }
    }

    pub(crate) fn recompute_parents_in_place(&mut self) {
        let catalog = Arc::clone(&self.catalog);
        for (module_position, module) in catalog.modules().iter().enumerate() {
            for parent in module.parent_positions() {
                let slot = ItemSlot {
                    module: module_position,
                    item: parent,
                };
                let reduced = self.reduce_parent(module, slot);
                if reduced != self.values_at(slot) {
                    self.set_values(slot, reduced);
                }
            }
        }
    }

    /// AND-reduces the children of the parent at `slot`.
    pub(crate) fn reduce_parent(&self, module: &CatalogModule, slot: ItemSlot) -> ActionSet {
        let mut granted = self.values_at(slot);
        let Some(parent) = module.items().get(slot.item) else {
            return granted;
        };
        let children = module.child_positions(slot.item);

        for action in parent.supported_actions().iter() {
            let mut relevant = children
                .iter()
                .filter(|child| {
                    module
                        .items()
                        .get(**child)
                        .is_some_and(|item| item.supports(action))
                })
                .peekable();

            if relevant.peek().is_none() {
                continue;
            }

            let all_granted = relevant.all(|child| {
                self.values_at(ItemSlot {
                    module: slot.module,
                    item: *child,
                })
                .contains(action)
            });
            granted = granted.with(action, all_granted);
        }

        granted
    }

    #[cfg(test)]
    pub(crate) fn shares_module_with(&self, other: &Self, module_key: &str) -> bool {
        self.catalog
            .module_position(module_key)
            .and_then(|position| Some((self.modules.get(position)?, other.modules.get(position)?)))
            .is_some_and(|(left, right)| Arc::ptr_eq(left, right))
    }
}

impl PartialEq for PermissionTree {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.catalog, &other.catalog) || self.catalog == other.catalog)
            && self.modules == other.modules
    }
}

impl Eq for PermissionTree {}

/// Persisted form of a tree: `module → item → action → granted`.
///
/// Structural fields are written for readers of the stored document but are
/// never trusted when a snapshot is read back; the catalog owns shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Modules keyed by module key.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSnapshot>,
}

/// Persisted module entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    /// Display label at the time of saving.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Items keyed by item key.
    #[serde(default)]
    pub items: BTreeMap<String, ItemSnapshot>,
}

/// Persisted item entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Action values keyed by action name. Unknown names are ignored on read.
    #[serde(default)]
    pub actions: BTreeMap<String, bool>,
    /// Role at the time of saving.
    #[serde(default)]
    pub role: Option<ItemRoleKind>,
    /// Parent key at the time of saving.
    #[serde(default)]
    pub parent_key: Option<String>,
}

impl ItemSnapshot {
    /// Iterates recognised actions with their stored values.
    pub fn known_actions(&self) -> impl Iterator<Item = (PermissionAction, bool)> + '_ {
        self.actions.iter().filter_map(|(name, granted)| {
            PermissionAction::from_str(name.as_str())
                .ok()
                .map(|action| (action, *granted))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::PermissionTree;
    use crate::test_support::dashboard_catalog;
    use crate::{ItemRoleKind, PermissionAction};

    #[test]
    fn baseline_is_blank_and_reports_only_supported_actions() {
        let tree = PermissionTree::baseline(dashboard_catalog());

        assert!(tree.is_blank());
        assert_eq!(
            tree.value("dashboard", "overviewWidget", PermissionAction::Export),
            Some(false)
        );
        assert_eq!(
            tree.value("dashboard", "alertsPanel", PermissionAction::Export),
            None
        );
        assert_eq!(tree.value("dashboard", "missing", PermissionAction::View), None);
    }

    #[test]
    fn snapshot_lists_supported_actions_and_structure() {
        let tree = PermissionTree::baseline(dashboard_catalog());
        let snapshot = tree.to_snapshot();

        let alerts = snapshot
            .modules
            .get("dashboard")
            .and_then(|module| module.items.get("alertsPanel"));
        let Some(alerts) = alerts else {
            panic!("alerts panel should be present in the snapshot");
        };

        assert_eq!(alerts.actions.len(), 2);
        assert_eq!(alerts.role, Some(ItemRoleKind::Child));
        assert_eq!(alerts.parent_key.as_deref(), Some("dashboard"));
    }

    #[test]
    fn snapshot_survives_json_and_skips_unknown_action_names() {
        let raw = r#"{"modules":{"dashboard":{"items":{"alertsPanel":{
            "actions":{"view":true,"archive":true}
        }}}}}"#;
        let snapshot: Result<super::TreeSnapshot, _> = serde_json::from_str(raw);
        let Ok(snapshot) = snapshot else {
            panic!("snapshot should deserialize");
        };

        let actions: Vec<_> = snapshot
            .modules
            .get("dashboard")
            .and_then(|module| module.items.get("alertsPanel"))
            .map(|item| item.known_actions().collect())
            .unwrap_or_default();
        assert_eq!(actions, vec![(PermissionAction::View, true)]);
    }

    #[test]
    fn clones_share_storage_until_written() {
        let catalog = dashboard_catalog();
        let tree = PermissionTree::baseline(Arc::clone(&catalog));
        let copy = tree.clone();

        assert!(tree.shares_module_with(&copy, "dashboard"));
        assert_eq!(tree, copy);
    }
}
