//! Registry, tribes, and population balancing for the Tribal admission
//! controller.
//!
//! This crate models the world the gateway admits people into: a registry
//! of admitted persons, an ordered list of fixed-capacity tribes, the rule
//! for picking the tribe that receives the next entrant, and the policies
//! consulted once every tribe is full.
//!
//! # Modules
//!
//! - [`birth_place`] -- [`BirthPlacePolicy`] for overflow admission.
//! - [`category`] -- [`CategorySource`] lookup and the deterministic
//!   [`CategoryDraw`] fallback.
//! - [`error`] -- Error types for admission operations.
//! - [`starting_world`] -- Genesis tribes for a new world.
//! - [`tribe`] -- [`Tribe`] rosters with per-category quotas.
//! - [`world`] -- [`WorldState`]: registry plus tribes, kept consistent.

pub mod birth_place;
pub mod category;
pub mod error;
pub mod starting_world;
pub mod tribe;
pub mod world;

// Re-export primary types at crate root.
pub use birth_place::{BirthPlacePolicy, DEFAULT_MAX_POPULATION, NoBirthPlaces, PopulationCap};
pub use category::{
    CategoryDraw, CategorySource, DEFAULT_CATEGORY_SALT, FixedCategory, NoCategorySource,
};
pub use error::WorldError;
pub use starting_world::{StartingWorld, create_starting_world};
pub use tribe::{Tribe, TribeMember};
pub use world::WorldState;
