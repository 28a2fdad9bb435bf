//! Error types for the `tribal-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use tribal_types::{Category, PersonId};

/// Errors that can occur while admitting people into the world.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The identity is already registered.
    #[error("person already known: {0}")]
    AlreadyKnown(PersonId),

    /// The target tribe has no room left for the category.
    #[error("tribe {tribe} has no open {category} slots (capacity {capacity})")]
    QuotaExceeded {
        /// The tribe that was full for this category.
        tribe: String,
        /// The category that was refused.
        category: Category,
        /// The tribe's capacity for that category.
        capacity: u32,
    },

    /// Every tribe is full.
    #[error("every tribe is full")]
    WorldFull,

    /// No person with this identity is registered.
    #[error("person not found: {0}")]
    PersonNotFound(PersonId),

    /// The registry and the tribe rosters disagree.
    #[error("inconsistent world state: {reason}")]
    InvalidState {
        /// Description of the inconsistency.
        reason: String,
    },
}
