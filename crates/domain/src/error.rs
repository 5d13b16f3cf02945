use rolegrid_core::AppError;
use thiserror::Error;

/// Failures raised by the permission tree engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionTreeError {
    /// An edit referenced a module or item that is not part of the tree's shape.
    #[error("unknown permission item '{module_key}.{item_key}'")]
    UnknownItem {
        /// Module key supplied by the caller.
        module_key: String,
        /// Item key supplied by the caller.
        item_key: String,
    },

    /// The catalog declares a structure the engine cannot represent.
    #[error("catalog shape mismatch at '{module_key}.{item_key}': {detail}")]
    CatalogShapeMismatch {
        /// Module holding the offending item.
        module_key: String,
        /// Offending item key.
        item_key: String,
        /// Human-readable description of the violation.
        detail: String,
    },

    /// A module or item key appears more than once.
    #[error("duplicate catalog key '{0}'")]
    DuplicateKey(String),

    /// A key is empty or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid permission key '{0}'")]
    InvalidKey(String),

    /// An action name is not one of the closed action set.
    #[error("unknown permission action '{0}'")]
    UnknownAction(String),

    /// A code string is not of the form `module.item.action`.
    #[error("invalid permission code '{0}'")]
    InvalidCode(String),
}

impl From<PermissionTreeError> for AppError {
    fn from(value: PermissionTreeError) -> Self {
        match value {
            PermissionTreeError::UnknownItem { .. } => Self::NotFound(value.to_string()),
            other => Self::Validation(other.to_string()),
        }
    }
}
