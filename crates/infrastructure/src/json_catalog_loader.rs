use std::path::Path;
use std::sync::Arc;

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{CatalogDocument, PermissionCatalog};
use tracing::info;

const DEFAULT_CATALOG_JSON: &str = include_str!("../catalog/default_catalog.json");

/// Parses and validates a JSON catalog document.
pub fn parse_catalog_json(json: &str) -> AppResult<PermissionCatalog> {
    let document: CatalogDocument = serde_json::from_str(json)
        .map_err(|error| AppError::Validation(format!("invalid catalog document: {error}")))?;

    Ok(PermissionCatalog::from_document(document)?)
}

/// Reads, parses and validates a JSON catalog file.
pub async fn load_catalog_from_path(path: &Path) -> AppResult<Arc<PermissionCatalog>> {
    let json = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to read catalog file '{}': {error}",
            path.display()
        ))
    })?;

    let catalog = parse_catalog_json(json.as_str())?;
    info!(
        path = %path.display(),
        module_count = catalog.modules().len(),
        item_count = catalog.item_count(),
        "loaded permission catalog"
    );

    Ok(Arc::new(catalog))
}

/// Returns the bundled catalog.
pub fn default_catalog() -> AppResult<Arc<PermissionCatalog>> {
    parse_catalog_json(DEFAULT_CATALOG_JSON).map(Arc::new)
}

#[cfg(test)]
mod tests {
    use rolegrid_core::AppError;
    use rolegrid_domain::{ItemRole, PermissionAction};

    use super::{default_catalog, parse_catalog_json};

    #[test]
    fn bundled_catalog_validates() {
        let catalog = default_catalog();
        let Ok(catalog) = catalog else {
            panic!("bundled catalog should validate");
        };

        let keys: Vec<&str> = catalog
            .modules()
            .iter()
            .map(|module| module.key().as_str())
            .collect();
        assert_eq!(
            keys,
            vec![
                "main_dashboard",
                "main_scheduling",
                "admin_users",
                "admin_roles",
                "tools_leave",
                "tools_fir",
            ]
        );

        let Some(dashboard) = catalog.module("main_dashboard") else {
            panic!("dashboard module should exist");
        };
        assert_eq!(dashboard.children_of("dashboard").len(), 5);
        assert_eq!(
            dashboard.action_columns(),
            vec![
                PermissionAction::Full,
                PermissionAction::View,
                PermissionAction::Export
            ]
        );
        assert_eq!(dashboard.additional_permissions().len(), 2);
    }

    #[test]
    fn bundled_catalog_keeps_vacuous_parent_actions() {
        let Ok(catalog) = default_catalog() else {
            panic!("bundled catalog should validate");
        };
        let Some(generator) = catalog.item("main_scheduling", "scheduleGenerator") else {
            panic!("schedule generator should exist");
        };

        assert!(matches!(generator.role(), ItemRole::Parent));
        assert!(generator.supports(PermissionAction::View));
        assert!(
            catalog
                .module("main_scheduling")
                .map(|module| module.children_of("scheduleGenerator"))
                .unwrap_or_default()
                .iter()
                .all(|child| !child.supports(PermissionAction::View))
        );
    }

    #[test]
    fn malformed_documents_are_validation_errors() {
        assert!(matches!(
            parse_catalog_json("{\"modules\": 3}"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn children_pointing_at_children_are_rejected() {
        let json = r#"{
            "modules": [{
                "key": "tools",
                "display_name": "TOOLS",
                "items": [
                    {"key": "leave", "supported_actions": ["view"], "role": "parent"},
                    {"key": "requests", "supported_actions": ["view"], "role": "child", "parent_key": "leave"},
                    {"key": "drafts", "supported_actions": ["view"], "role": "child", "parent_key": "requests"}
                ]
            }]
        }"#;

        assert!(matches!(
            parse_catalog_json(json),
            Err(AppError::Validation(message)) if message.contains("drafts")
        ));
    }
}
