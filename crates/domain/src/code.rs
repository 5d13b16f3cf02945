use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    PermissionAction, PermissionCatalog, PermissionKey, PermissionTree, PermissionTreeError,
};

/// Separator between the parts of a code. Keys can never contain it.
pub const CODE_DELIMITER: char = '.';

/// Flat `module.item.action` identifier for one granted triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode {
    module_key: PermissionKey,
    item_key: PermissionKey,
    action: PermissionAction,
}

impl PermissionCode {
    /// Creates a code from its parts.
    #[must_use]
    pub fn new(
        module_key: PermissionKey,
        item_key: PermissionKey,
        action: PermissionAction,
    ) -> Self {
        Self {
            module_key,
            item_key,
            action,
        }
    }

    /// Returns the module key.
    #[must_use]
    pub fn module_key(&self) -> &PermissionKey {
        &self.module_key
    }

    /// Returns the item key.
    #[must_use]
    pub fn item_key(&self) -> &PermissionKey {
        &self.item_key
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> PermissionAction {
        self.action
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}{CODE_DELIMITER}{}{CODE_DELIMITER}{}",
            self.module_key, self.item_key, self.action
        )
    }
}

impl FromStr for PermissionCode {
    type Err = PermissionTreeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || PermissionTreeError::InvalidCode(value.to_owned());
        let mut parts = value.split(CODE_DELIMITER);
        let (Some(module_key), Some(item_key), Some(action), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            module_key: PermissionKey::new(module_key).map_err(|_| invalid())?,
            item_key: PermissionKey::new(item_key).map_err(|_| invalid())?,
            action: PermissionAction::from_str(action).map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = PermissionTreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(value.as_str())
    }
}

impl From<PermissionCode> for String {
    fn from(value: PermissionCode) -> Self {
        value.to_string()
    }
}

/// Emits one code per granted action in `tree`.
#[must_use]
pub fn build_codes(tree: &PermissionTree) -> BTreeSet<PermissionCode> {
    tree.granted_triples()
        .map(|(module_key, item_key, action)| {
            PermissionCode::new(module_key.clone(), item_key.clone(), action)
        })
        .collect()
}

/// Decodes `codes` onto a clean baseline of `catalog`.
///
/// Codes that are malformed or name a triple the catalog does not have are
/// ignored. Parent flags are not recomputed; follow with
/// [`PermissionTree::recompute_parents`] for a display-consistent tree.
#[must_use]
pub fn apply_codes<I, S>(catalog: &Arc<PermissionCatalog>, codes: I) -> PermissionTree
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tree = PermissionTree::baseline(Arc::clone(catalog));
    overlay_codes(&mut tree, codes);
    tree
}

/// Forces every resolvable code true on `tree`. Never clears a flag.
pub(crate) fn overlay_codes<I, S>(tree: &mut PermissionTree, codes: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let catalog = Arc::clone(tree.catalog());
    for raw in codes {
        let Ok(code) = PermissionCode::from_str(raw.as_ref()) else {
            continue;
        };
        let Some(slot) = catalog.slot(code.module_key.as_str(), code.item_key.as_str()) else {
            continue;
        };
        let supported = catalog
            .modules()
            .get(slot.module)
            .and_then(|module| module.items().get(slot.item))
            .is_some_and(|item| item.supports(code.action));
        if supported {
            let granted = tree.values_at(slot).with(code.action, true);
            tree.set_values(slot, granted);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{PermissionCode, apply_codes, build_codes};
    use crate::test_support::{combined_catalog, dashboard_catalog};
    use crate::{PermissionAction, PermissionKey, PermissionTree, apply_toggle};

    use PermissionAction::{Export, Full, View};

    #[test]
    fn code_format_roundtrip() {
        let code = PermissionCode::from_str("dashboard.alertsPanel.view");
        let Ok(code) = code else {
            panic!("code should parse");
        };

        assert_eq!(code.module_key().as_str(), "dashboard");
        assert_eq!(code.item_key().as_str(), "alertsPanel");
        assert_eq!(code.action(), View);
        assert_eq!(code.to_string(), "dashboard.alertsPanel.view");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for raw in [
            "",
            "dashboard",
            "dashboard.view",
            "dashboard.alertsPanel.view.extra",
            "dashboard.alertsPanel.archive",
            "dash board.alertsPanel.view",
            "dashboard..view",
        ] {
            assert!(PermissionCode::from_str(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn build_codes_after_parent_full_lists_every_true_triple() {
        let tree = PermissionTree::baseline(dashboard_catalog());
        let Ok(tree) = apply_toggle(&tree, "dashboard", "dashboard", Full, true) else {
            panic!("toggle should succeed");
        };

        let mut codes: Vec<String> = build_codes(&tree).iter().map(ToString::to_string).collect();
        codes.sort_unstable();
        let mut expected = vec![
            "dashboard.dashboard.full",
            "dashboard.dashboard.view",
            "dashboard.dashboard.export",
            "dashboard.overviewWidget.full",
            "dashboard.overviewWidget.view",
            "dashboard.overviewWidget.export",
            "dashboard.alertsPanel.full",
            "dashboard.alertsPanel.view",
        ];
        expected.sort_unstable();
        assert_eq!(codes, expected);
    }

    #[test]
    fn build_codes_on_blank_tree_is_empty() {
        let tree = PermissionTree::baseline(dashboard_catalog());
        assert!(build_codes(&tree).is_empty());
    }

    #[test]
    fn apply_codes_does_not_recompute_parents() {
        let catalog = dashboard_catalog();
        let tree = apply_codes(
            &catalog,
            ["dashboard.overviewWidget.view", "dashboard.alertsPanel.view"],
        );

        assert_eq!(tree.value("dashboard", "dashboard", View), Some(false));
        assert_eq!(
            tree.recompute_parents().value("dashboard", "dashboard", View),
            Some(true)
        );
    }

    #[test]
    fn single_child_code_keeps_parent_false_after_recompute() {
        let catalog = dashboard_catalog();
        let tree = apply_codes(&catalog, ["dashboard.alertsPanel.view"]).recompute_parents();

        assert_eq!(tree.value("dashboard", "alertsPanel", View), Some(true));
        assert_eq!(tree.value("dashboard", "overviewWidget", View), Some(false));
        assert_eq!(tree.value("dashboard", "dashboard", View), Some(false));
    }

    #[test]
    fn codes_from_several_modules_rebuild_the_same_tree() {
        let catalog = combined_catalog();
        let edits = [
            ("dashboard", "overviewWidget", View),
            ("scheduling", "generator", PermissionAction::Create),
            ("scheduling", "history", Export),
            ("tools", "fir", Full),
        ];
        let tree = edits.iter().fold(
            PermissionTree::baseline(catalog.clone()),
            |tree, (module_key, item_key, action)| {
                match apply_toggle(&tree, module_key, item_key, *action, true) {
                    Ok(next) => next,
                    Err(error) => panic!("toggle should succeed: {error}"),
                }
            },
        );

        let codes = build_codes(&tree);
        let rebuilt = apply_codes(&catalog, codes.iter().map(ToString::to_string));

        assert_eq!(rebuilt.recompute_parents(), tree);
        assert!(codes.iter().any(|code| code.module_key().as_str() == "tools"));
    }

    #[test]
    fn unresolvable_codes_are_ignored() {
        let catalog = dashboard_catalog();
        let tree = apply_codes(
            &catalog,
            [
                "dashboard.alertsPanel.export",
                "dashboard.retiredWidget.view",
                "legacy.dashboard.view",
                "not a code",
                "dashboard.view",
            ],
        );

        assert!(tree.is_blank());
    }

    #[test]
    fn codes_serialize_as_plain_strings() {
        let code = PermissionCode::new(
            PermissionKey::new("dashboard").unwrap_or_else(|_| panic!("valid key")),
            PermissionKey::new("overviewWidget").unwrap_or_else(|_| panic!("valid key")),
            Export,
        );

        let encoded = serde_json::to_string(&code).ok();
        assert_eq!(encoded.as_deref(), Some("\"dashboard.overviewWidget.export\""));

        let decoded: Option<PermissionCode> = encoded
            .as_deref()
            .and_then(|encoded| serde_json::from_str(encoded).ok());
        assert_eq!(decoded, Some(code));
        assert!(serde_json::from_str::<PermissionCode>("\"dashboard\"").is_err());
    }
}
