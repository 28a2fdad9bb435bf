//! Shared type definitions for the Tribal admission controller.
//!
//! This crate is the single source of truth for the identifiers, enums,
//! and records that flow between the world model, the admission gateway,
//! and the persisted game file.
//!
//! # Modules
//!
//! - [`ids`] -- [`GameId`] (UUID) and [`PersonId`] (host account id)
//! - [`enums`] -- [`Category`] for quota balancing, [`AuthResponse`]
//! - [`structs`] -- [`PersonRecord`] and [`AuthMessage`]

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AuthResponse, Category};
pub use ids::{GameId, PersonId};
pub use structs::{AuthMessage, PersonRecord};
