use std::env;
use std::path::PathBuf;

use rolegrid_core::{Actor, AppError, AppResult};

const DEFAULT_ACTOR: &str = "rolegrid-cli";

/// Process configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CliConfig {
    pub(crate) catalog_path: Option<PathBuf>,
    pub(crate) roles_path: Option<PathBuf>,
    pub(crate) actor_subject: String,
    pub(crate) actor_name: String,
}

impl CliConfig {
    pub(crate) fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let catalog_path = optional_path_env(&lookup, "ROLEGRID_CATALOG_PATH")?;
        let roles_path = optional_path_env(&lookup, "ROLEGRID_ROLES_PATH")?;
        let actor_subject = lookup("ROLEGRID_ACTOR")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTOR.to_owned());
        let actor_name = lookup("ROLEGRID_ACTOR_NAME")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| actor_subject.clone());

        Ok(Self {
            catalog_path,
            roles_path,
            actor_subject,
            actor_name,
        })
    }

    pub(crate) fn actor(&self) -> Actor {
        Actor::new(self.actor_subject.as_str(), self.actor_name.as_str())
    }
}

fn optional_path_env(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> AppResult<Option<PathBuf>> {
    match lookup(name) {
        Some(value) if value.trim().is_empty() => Err(AppError::Validation(format!(
            "{name} must not be empty when set"
        ))),
        Some(value) => Ok(Some(PathBuf::from(value.trim()))),
        None => Ok(None),
    }
}
