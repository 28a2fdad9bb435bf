//! Core record types: admitted persons and admission decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{AuthResponse, Category};
use crate::ids::PersonId;

/// A person admitted into the world.
///
/// Created exactly once, the first time an identity is let in, and never
/// removed. The category is stored here at admission and is authoritative
/// from then on; nothing recomputes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Host identity of the person.
    pub id: PersonId,
    /// Display name reported by the host at admission.
    pub name: String,
    /// Balancing category assigned at admission.
    pub category: Category,
    /// Set at admission. Nothing clears it yet.
    pub alive: bool,
    /// Real-world admission time.
    pub joined_at: DateTime<Utc>,
}

/// Decision returned to the host for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMessage {
    /// Whether the connection is let through.
    pub response: AuthResponse,
    /// Human-readable reason. Shown verbatim to rejected clients.
    pub reason: String,
}

impl AuthMessage {
    /// Build an accepting decision.
    pub fn accepted(reason: impl Into<String>) -> Self {
        Self {
            response: AuthResponse::Accepted,
            reason: reason.into(),
        }
    }

    /// Build a rejecting decision.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            response: AuthResponse::Rejected,
            reason: reason.into(),
        }
    }

    /// Whether this decision lets the client in.
    pub const fn is_accepted(&self) -> bool {
        matches!(self.response, AuthResponse::Accepted)
    }

    /// One-line rendering for logs, e.g. `Rejected: no spawn points`.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.response, self.reason)
    }
}
