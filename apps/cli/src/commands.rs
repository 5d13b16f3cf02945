use std::collections::BTreeSet;
use std::sync::Arc;

use rolegrid_application::{RoleEditorService, RoleRecord, RoleRepository};
use rolegrid_core::AppResult;
use rolegrid_domain::{ItemRole, PermissionCatalog, PermissionCode};
use rolegrid_infrastructure::{
    InMemoryAuditRepository, InMemoryRoleRepository, JsonFileRoleRepository, default_catalog,
    load_catalog_from_path,
};

use crate::config::CliConfig;

pub(crate) async fn load_catalog(config: &CliConfig) -> AppResult<Arc<PermissionCatalog>> {
    match config.catalog_path.as_deref() {
        Some(path) => load_catalog_from_path(path).await,
        None => default_catalog(),
    }
}

pub(crate) async fn build_service(config: &CliConfig) -> AppResult<RoleEditorService> {
    let catalog = load_catalog(config).await?;
    let repository: Arc<dyn RoleRepository> = match config.roles_path.as_deref() {
        Some(path) => Arc::new(JsonFileRoleRepository::open(path).await?),
        None => Arc::new(InMemoryRoleRepository::new()),
    };

    Ok(RoleEditorService::new(
        catalog,
        repository,
        Arc::new(InMemoryAuditRepository::new()),
    ))
}

pub(crate) fn render_catalog_summary(catalog: &PermissionCatalog) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(catalog.modules().len() + 1);
    for module in catalog.modules() {
        let parents = module
            .items()
            .iter()
            .filter(|item| matches!(item.role(), ItemRole::Parent))
            .count();
        let columns: Vec<&str> = module
            .action_columns()
            .iter()
            .map(|action| action.as_str())
            .collect();

        lines.push(format!(
            "{} ({}): {} items, {} parents, actions [{}]",
            module.key(),
            module.display_name(),
            module.items().len(),
            parents,
            columns.join(", ")
        ));
    }

    lines.push(format!(
        "{} modules, {} items",
        catalog.modules().len(),
        catalog.item_count()
    ));
    lines.join("\n")
}

pub(crate) fn render_codes(codes: &BTreeSet<PermissionCode>) -> String {
    if codes.is_empty() {
        return "(no permission codes)".to_owned();
    }

    codes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn render_roles(roles: &[RoleRecord]) -> String {
    if roles.is_empty() {
        return "(no roles)".to_owned();
    }

    roles
        .iter()
        .map(|role| {
            format!(
                "{}  {}  {} codes{}",
                role.role_id,
                role.name,
                role.effective_codes.len(),
                if role.stored_tree.is_some() {
                    ""
                } else {
                    ", no stored tree"
                }
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rolegrid_domain::PermissionCode;
    use rolegrid_infrastructure::default_catalog;

    use super::{render_catalog_summary, render_codes};

    #[test]
    fn catalog_summary_lists_every_module() {
        let Ok(catalog) = default_catalog() else {
            panic!("bundled catalog should validate");
        };

        let summary = render_catalog_summary(&catalog);

        assert!(summary.contains("main_dashboard (MAIN - Dashboard): 6 items, 1 parents"));
        assert!(summary.ends_with(&format!("6 modules, {} items", catalog.item_count())));
    }

    #[test]
    fn codes_render_one_per_line() {
        let codes: BTreeSet<PermissionCode> = [
            "tools_fir.firReporter.view",
            "main_dashboard.dashboard.view",
        ]
        .iter()
        .filter_map(|code| code.parse().ok())
        .collect();

        assert_eq!(
            render_codes(&codes),
            "main_dashboard.dashboard.view\ntools_fir.firReporter.view"
        );
        assert_eq!(render_codes(&BTreeSet::new()), "(no permission codes)");
    }
}
