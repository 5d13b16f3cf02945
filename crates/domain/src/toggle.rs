use crate::catalog::ItemSlot;
use crate::{ActionSet, ItemRole, PermissionAction, PermissionTree, PermissionTreeError};

/// Applies one edit and the propagation it triggers, returning a new tree.
///
/// - Parent: the edit applies to the parent and to every one of its children.
/// - Child: the edit applies to the child, then the parent is AND-reduced
///   from its children.
/// - Standalone: the edit applies to the item alone.
///
/// Setting [`PermissionAction::Full`] also sets every other action the item
/// supports. The converse never sets `Full`.
///
/// Unsupported actions are a no-op. `tree` itself is never modified.
pub fn apply_toggle(
    tree: &PermissionTree,
    module_key: &str,
    item_key: &str,
    action: PermissionAction,
    value: bool,
) -> Result<PermissionTree, PermissionTreeError> {
    let catalog = tree.catalog();
    let (slot, module) = catalog
        .slot(module_key, item_key)
        .and_then(|slot| Some((slot, catalog.modules().get(slot.module)?)))
        .ok_or_else(|| PermissionTreeError::UnknownItem {
            module_key: module_key.to_owned(),
            item_key: item_key.to_owned(),
        })?;
    let Some(item) = module.items().get(slot.item) else {
        return Err(PermissionTreeError::UnknownItem {
            module_key: module_key.to_owned(),
            item_key: item_key.to_owned(),
        });
    };

    if !item.supports(action) {
        return Ok(tree.clone());
    }

    let mut next = tree.clone();
    let edit = |next: &mut PermissionTree, position: usize, supported: ActionSet| {
        let target = ItemSlot {
            module: slot.module,
            item: position,
        };
        let updated = cascade(next.values_at(target), supported, action, value);
        next.set_values(target, updated);
    };

    edit(&mut next, slot.item, item.supported_actions());

    match item.role() {
        ItemRole::Parent => {
            for child in module.child_positions(slot.item) {
                if let Some(child_item) = module.items().get(*child) {
                    edit(&mut next, *child, child_item.supported_actions());
                }
            }
        }
        ItemRole::Child { .. } => {
            if let Some(parent) = module.parent_position(slot.item) {
                let parent_slot = ItemSlot {
                    module: slot.module,
                    item: parent,
                };
                let reduced = next.reduce_parent(module, parent_slot);
                next.set_values(parent_slot, reduced);
            }
        }
        ItemRole::Standalone => {}
    }

    Ok(next)
}

/// Sets `action` to `value` within `supported`; `Full` drags every supported
/// action along with it.
fn cascade(
    granted: ActionSet,
    supported: ActionSet,
    action: PermissionAction,
    value: bool,
) -> ActionSet {
    let affected = match action {
        PermissionAction::Full => supported,
        PermissionAction::View
        | PermissionAction::Create
        | PermissionAction::Edit
        | PermissionAction::Delete
        | PermissionAction::Approve
        | PermissionAction::Export => supported.intersection(ActionSet::empty().with(action, true)),
    };

    if value {
        granted.union(affected)
    } else {
        granted.difference(affected)
    }
}
