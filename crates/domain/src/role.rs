use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{PermissionCode, PermissionTree, TreeSnapshot, build_codes};

/// The two persisted representations of a role's grants, saved together.
///
/// Only constructible from a live tree, so the flat codes are always derived
/// from the tree at the moment of saving and can never drift from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    tree: TreeSnapshot,
    codes: BTreeSet<PermissionCode>,
}

impl RolePermissions {
    /// Derives both persisted forms from `tree`.
    #[must_use]
    pub fn from_tree(tree: &PermissionTree) -> Self {
        Self {
            tree: tree.to_snapshot(),
            codes: build_codes(tree),
        }
    }

    /// Returns the granular tree snapshot.
    #[must_use]
    pub fn tree(&self) -> &TreeSnapshot {
        &self.tree
    }

    /// Returns the derived code set.
    #[must_use]
    pub fn codes(&self) -> &BTreeSet<PermissionCode> {
        &self.codes
    }

    /// Returns the derived codes as storage strings.
    #[must_use]
    pub fn code_strings(&self) -> Vec<String> {
        self.codes.iter().map(ToString::to_string).collect()
    }

    /// Splits into the tree snapshot and the code set.
    #[must_use]
    pub fn into_parts(self) -> (TreeSnapshot, BTreeSet<PermissionCode>) {
        (self.tree, self.codes)
    }
}
