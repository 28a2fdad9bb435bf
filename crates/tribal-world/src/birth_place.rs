//! Overflow admission once every tribe has filled.
//!
//! After the populating phase ends, a new identity can only get in if a
//! birth place is free. What counts as a birth place is a policy decision,
//! so it sits behind the [`BirthPlacePolicy`] trait. The gateway asks the
//! policy and either admits the person without a tribe or rejects them.

use tribal_types::PersonId;

use crate::world::WorldState;

/// Population ceiling used by [`PopulationCap::default`].
pub const DEFAULT_MAX_POPULATION: u32 = 50;

/// Decides whether a newcomer may be born into a full world.
pub trait BirthPlacePolicy: Send + Sync {
    /// Whether a birth place is available for `id` in `world`.
    fn is_birth_place_available(&self, world: &WorldState, id: PersonId) -> bool;
}

/// Never offers a birth place. Everyone arriving after the populating
/// phase is turned away.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBirthPlaces;

impl BirthPlacePolicy for NoBirthPlaces {
    fn is_birth_place_available(&self, _world: &WorldState, _id: PersonId) -> bool {
        false
    }
}

/// Offers birth places while the world holds fewer people than a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationCap {
    max_population: u32,
}

impl PopulationCap {
    /// Create a policy admitting newcomers until `max_population` is reached.
    pub const fn new(max_population: u32) -> Self {
        Self { max_population }
    }

    /// The configured ceiling.
    pub const fn max_population(&self) -> u32 {
        self.max_population
    }
}

impl Default for PopulationCap {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POPULATION)
    }
}

impl BirthPlacePolicy for PopulationCap {
    fn is_birth_place_available(&self, world: &WorldState, _id: PersonId) -> bool {
        world.population() < self.max_population
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tribal_types::Category;

    use super::*;
    use crate::tribe::Tribe;

    #[test]
    fn no_birth_places_always_refuses() {
        let world = WorldState::new(Vec::new());
        assert!(!NoBirthPlaces.is_birth_place_available(&world, PersonId(1)));
    }

    #[test]
    fn population_cap_counts_everyone_in_the_registry() {
        let mut world = WorldState::new(vec![Tribe::with_uniform_capacity("Alpha", 1)]);
        let policy = PopulationCap::new(3);

        world.admit_new(PersonId(1), "a", Category::Male).unwrap();
        world.admit_new(PersonId(2), "b", Category::Female).unwrap();
        assert!(policy.is_birth_place_available(&world, PersonId(3)));

        world.admit_unaffiliated(PersonId(3), "c", Category::Male).unwrap();
        assert!(!policy.is_birth_place_available(&world, PersonId(4)));
    }

    #[test]
    fn population_cap_default_matches_constant() {
        assert_eq!(PopulationCap::default().max_population(), DEFAULT_MAX_POPULATION);
    }
}
