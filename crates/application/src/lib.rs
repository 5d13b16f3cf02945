//! Application services and ports.

#![forbid(unsafe_code)]

mod role_editor_service;
mod role_ports;

pub use role_editor_service::{RoleEditSession, RoleEditorService};
pub use role_ports::{
    AuditEvent, AuditRepository, CreateRoleInput, RoleDetails, RoleRecord, RoleRepository,
};
