use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PermissionTreeError;

/// Capability flags an item can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Grants every other action the item supports.
    Full,
    /// Allows reading.
    View,
    /// Allows creating.
    Create,
    /// Allows editing.
    Edit,
    /// Allows deleting.
    Delete,
    /// Allows approving.
    Approve,
    /// Allows exporting.
    Export,
}

impl PermissionAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Approve => "approve",
            Self::Export => "export",
        }
    }

    /// Returns all actions in canonical column order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionAction] = &[
            PermissionAction::Full,
            PermissionAction::View,
            PermissionAction::Create,
            PermissionAction::Edit,
            PermissionAction::Delete,
            PermissionAction::Approve,
            PermissionAction::Export,
        ];

        ALL
    }

    const fn bit(self) -> u8 {
        match self {
            Self::Full => 1 << 0,
            Self::View => 1 << 1,
            Self::Create => 1 << 2,
            Self::Edit => 1 << 3,
            Self::Delete => 1 << 4,
            Self::Approve => 1 << 5,
            Self::Export => 1 << 6,
        }
    }
}

impl Display for PermissionAction {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = PermissionTreeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "full" => Ok(Self::Full),
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            "approve" => Ok(Self::Approve),
            "export" => Ok(Self::Export),
            _ => Err(PermissionTreeError::UnknownAction(value.to_owned())),
        }
    }
}

/// Compact set of [`PermissionAction`] values.
///
/// Used both for the actions an item supports and for the actions currently
/// granted on it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ActionSet(u8);

impl ActionSet {
    /// Returns the empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns a set holding every action.
    #[must_use]
    pub fn all() -> Self {
        PermissionAction::all().iter().copied().collect()
    }

    /// Returns whether `action` is a member.
    #[must_use]
    pub fn contains(self, action: PermissionAction) -> bool {
        self.0 & action.bit() != 0
    }

    /// Returns a copy with `action` added or removed.
    #[must_use]
    pub fn with(self, action: PermissionAction, present: bool) -> Self {
        if present {
            Self(self.0 | action.bit())
        } else {
            Self(self.0 & !action.bit())
        }
    }

    /// Adds `action` in place.
    pub fn insert(&mut self, action: PermissionAction) {
        *self = self.with(action, true);
    }

    /// Returns the members of both sets.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns the members of either set.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the members of `self` that are not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns whether the set has no members.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of members.
    #[must_use]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = PermissionAction> {
        PermissionAction::all()
            .iter()
            .copied()
            .filter(move |action| self.contains(*action))
    }
}

impl FromIterator<PermissionAction> for ActionSet {
    fn from_iter<T: IntoIterator<Item = PermissionAction>>(iter: T) -> Self {
        let mut set = Self::empty();
        for action in iter {
            set.insert(action);
        }
        set
    }
}

impl std::fmt::Debug for ActionSet {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}
