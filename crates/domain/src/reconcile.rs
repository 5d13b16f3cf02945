use std::sync::Arc;

use crate::code::overlay_codes;
use crate::{PermissionCatalog, PermissionTree, TreeSnapshot};

/// Builds the editable tree for a freshly loaded role.
///
/// Order matters:
/// 1. start from the all-false baseline of `catalog`;
/// 2. copy stored values for items and actions the catalog still has;
/// 3. OR in `effective_codes`, which can only grant;
/// 4. recompute every parent from its children.
///
/// Shape always comes from `catalog`. Stored items, modules and actions it no
/// longer knows are dropped, as are codes that do not resolve.
#[must_use]
pub fn reconcile<I, S>(
    catalog: &Arc<PermissionCatalog>,
    stored: Option<&TreeSnapshot>,
    effective_codes: I,
) -> PermissionTree
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tree = PermissionTree::baseline(Arc::clone(catalog));

    if let Some(stored) = stored {
        overlay_snapshot(&mut tree, stored);
    }
    overlay_codes(&mut tree, effective_codes);
    tree.recompute_parents_in_place();

    tree
}

fn overlay_snapshot(tree: &mut PermissionTree, stored: &TreeSnapshot) {
    let catalog = Arc::clone(tree.catalog());
    for (module_key, module) in &stored.modules {
        for (item_key, item) in &module.items {
            let Some(slot) = catalog.slot(module_key, item_key) else {
                continue;
            };
            let Some(supported) = catalog
                .modules()
                .get(slot.module)
                .and_then(|module| module.items().get(slot.item))
                .map(|item| item.supported_actions())
            else {
                continue;
            };

            let granted = item
                .known_actions()
                .filter(|(action, _)| supported.contains(*action))
                .fold(tree.values_at(slot), |granted, (action, value)| {
                    granted.with(action, value)
                });
            tree.set_values(slot, granted);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::reconcile;
    use crate::test_support::dashboard_catalog;
    use crate::{
        ItemRoleKind, ItemSnapshot, ModuleSnapshot, PermissionAction, PermissionTree, TreeSnapshot,
        apply_toggle,
    };

    use PermissionAction::{Export, Full, View};

    fn stored_item(actions: &[(&str, bool)]) -> ItemSnapshot {
        ItemSnapshot {
            actions: actions
                .iter()
                .map(|(name, value)| ((*name).to_owned(), *value))
                .collect(),
            role: None,
            parent_key: None,
        }
    }

    fn stored_tree(modules: Vec<(&str, Vec<(&str, ItemSnapshot)>)>) -> TreeSnapshot {
        TreeSnapshot {
            modules: modules
                .into_iter()
                .map(|(module_key, items)| {
                    let items: BTreeMap<_, _> = items
                        .into_iter()
                        .map(|(item_key, item)| (item_key.to_owned(), item))
                        .collect();
                    (
                        module_key.to_owned(),
                        ModuleSnapshot {
                            display_name: None,
                            items,
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn empty_inputs_yield_the_baseline() {
        let catalog = dashboard_catalog();
        let tree = reconcile(&catalog, None, Vec::<String>::new());
        assert_eq!(tree, PermissionTree::baseline(catalog));
    }

    #[test]
    fn stored_values_are_copied_for_supported_actions_only() {
        let catalog = dashboard_catalog();
        let stored = stored_tree(vec![(
            "dashboard",
            vec![
                ("overviewWidget", stored_item(&[("view", true), ("export", true)])),
                ("alertsPanel", stored_item(&[("view", true), ("export", true)])),
            ],
        )]);

        let tree = reconcile(&catalog, Some(&stored), Vec::<String>::new());

        assert_eq!(tree.value("dashboard", "overviewWidget", View), Some(true));
        assert_eq!(tree.value("dashboard", "overviewWidget", Export), Some(true));
        assert_eq!(tree.value("dashboard", "alertsPanel", View), Some(true));
        assert_eq!(tree.granted("dashboard", "alertsPanel").map(|set| set.len()), Some(1));
    }

    #[test]
    fn stored_structure_never_changes_shape() {
        let catalog = dashboard_catalog();
        let mut hijack = stored_item(&[("view", true)]);
        hijack.role = Some(ItemRoleKind::Parent);
        hijack.parent_key = Some("standaloneReport".to_owned());
        let stored = stored_tree(vec![("dashboard", vec![("alertsPanel", hijack)])]);

        let tree = reconcile(&catalog, Some(&stored), Vec::<String>::new());
        let Ok(tree) = apply_toggle(&tree, "dashboard", "overviewWidget", View, true) else {
            panic!("toggle should succeed");
        };

        assert_eq!(tree.value("dashboard", "dashboard", View), Some(true));
        assert_eq!(tree.value("dashboard", "standaloneReport", View), Some(false));
    }

    #[test]
    fn unknown_stored_items_and_modules_are_dropped() {
        let catalog = dashboard_catalog();
        let stored = stored_tree(vec![
            ("dashboard", vec![("retiredWidget", stored_item(&[("view", true)]))]),
            ("legacy", vec![("dashboard", stored_item(&[("full", true)]))]),
        ]);

        let tree = reconcile(&catalog, Some(&stored), Vec::<String>::new());
        assert!(tree.is_blank());
    }

    #[test]
    fn effective_codes_only_grant() {
        let catalog = dashboard_catalog();
        let stored = stored_tree(vec![(
            "dashboard",
            vec![("standaloneReport", stored_item(&[("view", true), ("export", false)]))],
        )]);

        let tree = reconcile(
            &catalog,
            Some(&stored),
            ["dashboard.standaloneReport.export", "dashboard.unknown.view"],
        );

        assert_eq!(tree.value("dashboard", "standaloneReport", View), Some(true));
        assert_eq!(tree.value("dashboard", "standaloneReport", Export), Some(true));
    }

    #[test]
    fn stale_parent_values_are_recomputed_from_children() {
        let catalog = dashboard_catalog();
        let stored = stored_tree(vec![(
            "dashboard",
            vec![
                ("dashboard", stored_item(&[("full", true), ("view", true), ("export", true)])),
                ("overviewWidget", stored_item(&[("view", true)])),
            ],
        )]);

        let tree = reconcile(&catalog, Some(&stored), ["dashboard.alertsPanel.view"]);

        assert_eq!(tree.value("dashboard", "dashboard", View), Some(true));
        assert_eq!(tree.value("dashboard", "dashboard", Full), Some(false));
        assert_eq!(tree.value("dashboard", "dashboard", Export), Some(false));
    }
}
