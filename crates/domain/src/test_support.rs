use std::sync::Arc;

use crate::{CatalogDocument, ItemDocument, ModuleDocument, PermissionAction, PermissionCatalog};

use PermissionAction::{Approve, Create, Delete, Edit, Export, Full, View};

fn build(modules: Vec<ModuleDocument>) -> Arc<PermissionCatalog> {
    match PermissionCatalog::from_document(CatalogDocument { modules }) {
        Ok(catalog) => Arc::new(catalog),
        Err(error) => panic!("test catalog should validate: {error}"),
    }
}

pub(crate) fn dashboard_module() -> ModuleDocument {
    ModuleDocument::new(
        "dashboard",
        "MAIN - Dashboard",
        vec![
            ItemDocument::parent("dashboard", "Dashboard", &[Full, View, Export]),
            ItemDocument::child(
                "overviewWidget",
                "Overview Widget",
                "dashboard",
                &[Full, View, Export],
            ),
            ItemDocument::child("alertsPanel", "Alerts Panel", "dashboard", &[Full, View]),
            ItemDocument::standalone(
                "standaloneReport",
                "Standalone Report",
                &[Full, View, Export],
            ),
        ],
    )
}

pub(crate) fn dashboard_catalog() -> Arc<PermissionCatalog> {
    build(vec![dashboard_module()])
}

fn scheduling_modules() -> Vec<ModuleDocument> {
    vec![
        ModuleDocument::new(
            "scheduling",
            "MAIN - Scheduling",
            vec![
                ItemDocument::parent(
                    "generator",
                    "Schedule Generator",
                    &[Full, View, Create, Edit, Delete, Approve],
                ),
                ItemDocument::child("createSchedule", "Create Schedule", "generator", &[Create]),
                ItemDocument::child("editSchedule", "Edit Schedule", "generator", &[Edit]),
                ItemDocument::child("publishSchedule", "Publish Schedule", "generator", &[Approve]),
                ItemDocument::standalone("history", "History", &[View, Export]),
            ],
        ),
        ModuleDocument::new(
            "tools",
            "TOOLS",
            vec![ItemDocument::standalone(
                "fir",
                "FIR Reporter",
                &[Full, View, Create, Edit, Approve],
            )],
        ),
    ]
}

pub(crate) fn scheduling_catalog() -> Arc<PermissionCatalog> {
    build(scheduling_modules())
}

/// Every test module in one catalog.
pub(crate) fn combined_catalog() -> Arc<PermissionCatalog> {
    let mut modules = vec![dashboard_module()];
    modules.extend(scheduling_modules());
    build(modules)
}
