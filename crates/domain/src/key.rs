use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::PermissionTreeError;

/// Identifier-safe module or item key.
///
/// Keys are restricted to ASCII letters, digits, `_` and `-`, so the code
/// delimiter can never appear inside one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(String);

impl PermissionKey {
    /// Creates a validated key.
    pub fn new(value: impl Into<String>) -> Result<Self, PermissionTreeError> {
        let value = value.into();
        if !is_key_safe(value.as_str()) {
            return Err(PermissionTreeError::InvalidKey(value));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn is_key_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '_' | '-'))
}

impl TryFrom<String> for PermissionKey {
    type Error = PermissionTreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.0
    }
}

impl Borrow<str> for PermissionKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::PermissionKey;

    #[test]
    fn accepts_identifier_safe_keys() {
        for value in ["dashboard", "alertsPanel", "main_scheduling", "fir-reports", "v2"] {
            assert!(PermissionKey::new(value).is_ok(), "{value} should be accepted");
        }
    }

    #[test]
    fn rejects_delimiters_and_whitespace() {
        for value in ["", "dashboard.view", "Alerts Panel", "tab\t", "ü"] {
            assert!(PermissionKey::new(value).is_err(), "{value} should be rejected");
        }
    }
}
