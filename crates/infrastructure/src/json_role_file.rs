use std::path::{Path, PathBuf};

use rolegrid_application::RoleRecord;
use rolegrid_core::{AppError, AppResult};
use tracing::{debug, info};

/// Parses a JSON array of role records.
pub fn parse_role_records_json(json: &str) -> AppResult<Vec<RoleRecord>> {
    serde_json::from_str(json)
        .map_err(|error| AppError::Validation(format!("invalid role seed document: {error}")))
}

/// Reads a JSON array of role records.
pub async fn load_role_records_from_path(path: &Path) -> AppResult<Vec<RoleRecord>> {
    let json = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to read role seed file '{}': {error}",
            path.display()
        ))
    })?;

    let roles = parse_role_records_json(json.as_str())?;
    info!(path = %path.display(), role_count = roles.len(), "loaded role seed file");
    Ok(roles)
}

/// Writes role records as a JSON array, replacing the file in one rename.
pub async fn save_role_records_to_path(path: &Path, roles: &[RoleRecord]) -> AppResult<()> {
    let json = serde_json::to_string_pretty(roles)
        .map_err(|error| AppError::Internal(format!("failed to encode role records: {error}")))?;

    let staging = staging_path(path);
    tokio::fs::write(&staging, json).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to write role file '{}': {error}",
            staging.display()
        ))
    })?;
    tokio::fs::rename(&staging, path).await.map_err(|error| {
        AppError::Internal(format!(
            "failed to replace role file '{}': {error}",
            path.display()
        ))
    })?;

    debug!(path = %path.display(), role_count = roles.len(), "wrote role file");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(".tmp");
    path.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{parse_role_records_json, staging_path};

    #[test]
    fn parses_roles_with_stored_trees() {
        let json = r#"[
            {
                "role_id": "6f1c8a52-43de-4a8e-9c11-2b0c8b7f9e10",
                "name": "Supervisor",
                "is_manufacturing_role": true,
                "effective_codes": ["main_dashboard.dashboard.view"],
                "stored_tree": {
                    "modules": {
                        "main_dashboard": {
                            "items": {
                                "alertsPanel": {"actions": {"view": true, "export": false}}
                            }
                        }
                    }
                }
            }
        ]"#;

        let roles = parse_role_records_json(json);
        let Ok(roles) = roles else {
            panic!("seed document should parse");
        };
        assert_eq!(roles.len(), 1);
        assert!(roles[0].is_manufacturing_role);
        assert!(roles[0].stored_tree.is_some());
    }

    #[test]
    fn rejects_non_array_documents() {
        assert!(parse_role_records_json("{\"name\": \"Supervisor\"}").is_err());
    }

    #[test]
    fn staging_file_sits_next_to_the_target() {
        assert_eq!(
            staging_path(Path::new("fixtures/roles.json")),
            Path::new("fixtures/roles.json.tmp")
        );
    }
}
