//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_role_repository;
mod json_catalog_loader;
mod json_file_role_repository;
mod json_role_file;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use json_catalog_loader::{default_catalog, load_catalog_from_path, parse_catalog_json};
pub use json_file_role_repository::JsonFileRoleRepository;
pub use json_role_file::{
    load_role_records_from_path, parse_role_records_json, save_role_records_to_path,
};
