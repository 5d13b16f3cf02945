//! Role permission tree engine.
//!
//! A [`PermissionCatalog`] fixes which modules, items and actions exist. A
//! [`PermissionTree`] carries one boolean per supported action per item and is
//! edited through [`apply_toggle`], loaded through [`reconcile`] and flattened
//! through [`build_codes`] / [`apply_codes`]. Every operation returns a new
//! tree; none mutates its input.

#![forbid(unsafe_code)]

mod action;
mod catalog;
mod code;
mod error;
mod key;
mod reconcile;
mod role;
mod security;
mod toggle;
mod tree;

#[cfg(test)]
mod test_support;

pub use action::{ActionSet, PermissionAction};
pub use catalog::{
    CatalogDocument, CatalogItem, CatalogModule, ItemDocument, ItemRole, ItemRoleKind,
    ModuleDocument, PermissionCatalog,
};
pub use code::{CODE_DELIMITER, PermissionCode, apply_codes, build_codes};
pub use error::PermissionTreeError;
pub use key::PermissionKey;
pub use reconcile::reconcile;
pub use role::RolePermissions;
pub use security::AuditAction;
pub use toggle::apply_toggle;
pub use tree::{ItemSnapshot, ModuleSnapshot, PermissionTree, TreeSnapshot};
