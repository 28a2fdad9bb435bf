//! Enumeration types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Balancing category of a person, fixed once at admission.
///
/// Tribes reserve a number of slots per category. Everything that counts
/// or iterates categories goes through [`Category::ALL`], so adding a
/// variant here is enough to balance over more than two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Male player character.
    Male,
    /// Female player character.
    Female,
}

impl Category {
    /// Every category, in draw order.
    pub const ALL: [Self; 2] = [Self::Male, Self::Female];

    /// Lowercase label used in player-facing text.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome kind of an admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthResponse {
    /// The host should let the connection complete.
    Accepted,
    /// The host should refuse the connection and show the reason.
    Rejected,
}

impl core::fmt::Display for AuthResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Accepted => f.write_str("Accepted"),
            Self::Rejected => f.write_str("Rejected"),
        }
    }
}
