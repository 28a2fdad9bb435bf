//! The world: a registry of admitted persons plus the ordered tribe list.
//!
//! [`WorldState`] keeps two views of the same population. The registry
//! (`people`) owns every [`PersonRecord`]; each [`Tribe`] roster holds
//! back-references by id. Both views are only ever changed together, by
//! [`WorldState::admit_new`] and [`WorldState::admit_unaffiliated`], and
//! [`WorldState::validate`] checks that they agree after a load.
//!
//! Tribe order is the fill order: the first open tribe always receives the
//! next entrant, so tribes fill strictly one after another.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tribal_types::{Category, PersonId, PersonRecord};

use crate::error::WorldError;
use crate::tribe::Tribe;

/// Registry and tribes of one game world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    /// Every admitted person, keyed by identity.
    people: BTreeMap<PersonId, PersonRecord>,
    /// Tribes in fill order.
    tribes: Vec<Tribe>,
}

impl WorldState {
    /// Create a world with the given tribes and nobody in it.
    pub const fn new(tribes: Vec<Tribe>) -> Self {
        Self {
            people: BTreeMap::new(),
            tribes,
        }
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Whether any tribe still has an open slot.
    ///
    /// Once this turns false it stays false: nobody ever leaves a tribe.
    pub fn is_populating(&self) -> bool {
        self.tribes.iter().any(Tribe::is_open)
    }

    /// The first open tribe in declaration order, if any.
    pub fn current_open_tribe(&self) -> Option<&Tribe> {
        self.tribes.iter().find(|t| t.is_open())
    }

    /// Look up an admitted person.
    pub fn find_person(&self, id: PersonId) -> Option<&PersonRecord> {
        self.people.get(&id)
    }

    /// Look up an admitted person, failing if the identity is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::PersonNotFound`] if `id` was never admitted.
    pub fn person(&self, id: PersonId) -> Result<&PersonRecord, WorldError> {
        self.find_person(id).ok_or(WorldError::PersonNotFound(id))
    }

    /// Whether the identity has been admitted before.
    pub fn is_known(&self, id: PersonId) -> bool {
        self.people.contains_key(&id)
    }

    /// Whether the identity is known and still alive.
    pub fn is_alive(&self, id: PersonId) -> bool {
        self.find_person(id).is_some_and(|p| p.alive)
    }

    /// The tribe whose roster contains `id`.
    pub fn tribe_of(&self, id: PersonId) -> Option<&Tribe> {
        self.tribes.iter().find(|t| t.contains(id))
    }

    /// Name of the tribe whose roster contains `id`.
    pub fn tribe_name_of(&self, id: PersonId) -> Option<&str> {
        self.tribe_of(id).map(Tribe::name)
    }

    /// Tribes in fill order.
    pub fn tribes(&self) -> &[Tribe] {
        &self.tribes
    }

    /// Number of admitted persons.
    pub fn population(&self) -> u32 {
        u32::try_from(self.people.len()).unwrap_or(u32::MAX)
    }

    // -------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------

    /// Admit a new person into the first open tribe.
    ///
    /// # Errors
    ///
    /// - [`WorldError::AlreadyKnown`] if the identity is registered already.
    /// - [`WorldError::WorldFull`] if no tribe is open.
    /// - [`WorldError::QuotaExceeded`] if the open tribe has no free slot
    ///   for `category`.
    pub fn admit_new(
        &mut self,
        id: PersonId,
        name: &str,
        category: Category,
    ) -> Result<&PersonRecord, WorldError> {
        if self.is_known(id) {
            return Err(WorldError::AlreadyKnown(id));
        }

        let tribe = self
            .tribes
            .iter_mut()
            .find(|t| t.is_open())
            .ok_or(WorldError::WorldFull)?;

        if !tribe.is_category_open(category) {
            return Err(WorldError::QuotaExceeded {
                tribe: tribe.name().to_owned(),
                category,
                capacity: tribe.capacity_for(category),
            });
        }

        let record = new_record(id, name, category);
        tribe.add(&record)?;
        debug!(person = %id, tribe = tribe.name(), "Adding member to tribe");
        info!(
            person = %id,
            name = name,
            category = %category,
            tribe = tribe.name(),
            "Person admitted"
        );

        register(&mut self.people, record)
    }

    /// Admit a new person without placing them in any tribe.
    ///
    /// Used for overflow admissions once every tribe has filled.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AlreadyKnown`] if the identity is registered.
    pub fn admit_unaffiliated(
        &mut self,
        id: PersonId,
        name: &str,
        category: Category,
    ) -> Result<&PersonRecord, WorldError> {
        let person = register(&mut self.people, new_record(id, name, category))?;
        info!(
            person = %id,
            name = name,
            category = %category,
            "Person admitted without a tribe"
        );
        Ok(person)
    }

    // -------------------------------------------------------------------
    // Consistency
    // -------------------------------------------------------------------

    /// Check that the registry and the tribe rosters describe the same
    /// population and that every quota holds.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidState`] describing the first problem
    /// found.
    pub fn validate(&self) -> Result<(), WorldError> {
        let mut tribe_names = BTreeSet::new();
        let mut placed = BTreeSet::new();

        for tribe in &self.tribes {
            if !tribe_names.insert(tribe.name()) {
                return Err(invalid(format!("duplicate tribe name {}", tribe.name())));
            }

            for &category in &Category::ALL {
                if tribe.count(category) > tribe.capacity_for(category) {
                    return Err(invalid(format!(
                        "tribe {} holds {} {category} members but has {} slots",
                        tribe.name(),
                        tribe.count(category),
                        tribe.capacity_for(category),
                    )));
                }
            }

            for member in tribe.members() {
                let Some(person) = self.people.get(&member.id) else {
                    return Err(invalid(format!(
                        "tribe {} lists unregistered person {}",
                        tribe.name(),
                        member.id
                    )));
                };
                if person.category != member.category {
                    return Err(invalid(format!(
                        "person {} is {} in the registry but {} in tribe {}",
                        member.id,
                        person.category,
                        member.category,
                        tribe.name()
                    )));
                }
                if !placed.insert(member.id) {
                    return Err(invalid(format!(
                        "person {} belongs to more than one tribe",
                        member.id
                    )));
                }
            }
        }

        for (key, person) in &self.people {
            if *key != person.id {
                return Err(invalid(format!(
                    "registry key {key} holds record for {}",
                    person.id
                )));
            }
        }

        Ok(())
    }
}

/// The only place a [`PersonRecord`] enters the registry.
fn register(
    people: &mut BTreeMap<PersonId, PersonRecord>,
    record: PersonRecord,
) -> Result<&PersonRecord, WorldError> {
    match people.entry(record.id) {
        Entry::Occupied(existing) => Err(WorldError::AlreadyKnown(*existing.key())),
        Entry::Vacant(slot) => Ok(slot.insert(record)),
    }
}

fn new_record(id: PersonId, name: &str, category: Category) -> PersonRecord {
    PersonRecord {
        id,
        name: name.to_owned(),
        category,
        alive: true,
        joined_at: Utc::now(),
    }
}

const fn invalid(reason: String) -> WorldError {
    WorldError::InvalidState { reason }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]
mod tests {
    use rand::Rng;

    use super::*;

    fn two_tribe_world() -> WorldState {
        WorldState::new(vec![
            Tribe::with_uniform_capacity("Alpha", 2),
            Tribe::with_uniform_capacity("Bravo", 2),
        ])
    }

    fn assert_quotas_hold(world: &WorldState) {
        for tribe in world.tribes() {
            for &c in &Category::ALL {
                assert!(tribe.count(c) <= tribe.capacity_for(c));
            }
        }
    }

    #[test]
    fn fresh_world_is_populating() {
        let world = two_tribe_world();
        assert!(world.is_populating());
        assert_eq!(world.current_open_tribe().map(Tribe::name), Some("Alpha"));
        assert_eq!(world.population(), 0);
    }

    #[test]
    fn admit_new_registers_and_places_person() {
        let mut world = two_tribe_world();
        let person = world.admit_new(PersonId(1), "Kora", Category::Female).unwrap();
        assert_eq!(person.id, PersonId(1));
        assert!(person.alive);

        assert!(world.is_known(PersonId(1)));
        assert!(world.is_alive(PersonId(1)));
        assert_eq!(world.tribe_name_of(PersonId(1)), Some("Alpha"));
        assert!(world.validate().is_ok());
    }

    #[test]
    fn person_lookup_reports_unknown_identity() {
        let mut world = two_tribe_world();
        world.admit_new(PersonId(1), "Kora", Category::Female).unwrap();
        assert_eq!(world.person(PersonId(1)).unwrap().name, "Kora");
        assert_eq!(
            world.person(PersonId(2)).unwrap_err(),
            WorldError::PersonNotFound(PersonId(2))
        );
    }

    #[test]
    fn duplicate_admission_is_already_known() {
        let mut world = two_tribe_world();
        world.admit_new(PersonId(1), "Kora", Category::Female).unwrap();
        let err = world.admit_new(PersonId(1), "Kora", Category::Female).unwrap_err();
        assert_eq!(err, WorldError::AlreadyKnown(PersonId(1)));
        assert_eq!(world.population(), 1);
        assert_eq!(world.tribes()[0].size(), 1);
    }

    #[test]
    fn closed_category_in_open_tribe_is_quota_exceeded() {
        let mut world = two_tribe_world();
        world.admit_new(PersonId(1), "a", Category::Male).unwrap();
        world.admit_new(PersonId(2), "b", Category::Male).unwrap();

        let err = world.admit_new(PersonId(3), "c", Category::Male).unwrap_err();
        assert!(matches!(err, WorldError::QuotaExceeded { ref tribe, .. } if tribe == "Alpha"));
        assert!(!world.is_known(PersonId(3)));
        assert!(world.is_populating());
    }

    #[test]
    fn tribes_fill_in_declaration_order() {
        let mut world = two_tribe_world();
        let order = [
            Category::Male,
            Category::Female,
            Category::Male,
            Category::Female,
        ];
        for (i, &c) in order.iter().enumerate() {
            world.admit_new(PersonId(i as u64), "x", c).unwrap();
        }
        assert!(!world.tribes()[0].is_open());
        assert_eq!(world.current_open_tribe().map(Tribe::name), Some("Bravo"));

        world.admit_new(PersonId(10), "y", Category::Female).unwrap();
        assert_eq!(world.tribe_name_of(PersonId(10)), Some("Bravo"));
    }

    #[test]
    fn full_world_reports_world_full_and_stays_closed() {
        let mut world = two_tribe_world();
        let mut next = 0_u64;
        for _ in 0..2 {
            for _ in 0..2 {
                for &c in &Category::ALL {
                    world.admit_new(PersonId(next), "x", c).unwrap();
                    next += 1;
                }
            }
        }
        assert!(!world.is_populating());
        assert!(world.current_open_tribe().is_none());
        assert_eq!(
            world.admit_new(PersonId(99), "late", Category::Male).unwrap_err(),
            WorldError::WorldFull
        );
        assert!(!world.is_populating());
    }

    #[test]
    fn unaffiliated_person_has_no_tribe() {
        let mut world = two_tribe_world();
        world.admit_unaffiliated(PersonId(5), "drifter", Category::Male).unwrap();
        assert!(world.is_known(PersonId(5)));
        assert_eq!(world.tribe_name_of(PersonId(5)), None);
        assert!(world.validate().is_ok());
        assert!(world.admit_unaffiliated(PersonId(5), "again", Category::Male).is_err());
    }

    #[test]
    fn quota_holds_for_random_admission_streams() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let mut world = two_tribe_world();
            let mut populating = true;
            for _ in 0..40 {
                let id = PersonId(rng.random::<u64>());
                let category = if rng.random::<bool>() {
                    Category::Male
                } else {
                    Category::Female
                };
                let _ = world.admit_new(id, "r", category);
                assert_quotas_hold(&world);
                if !populating {
                    assert!(!world.is_populating());
                }
                populating = world.is_populating();
            }
            assert!(world.validate().is_ok());
        }
    }

    #[test]
    fn validate_rejects_roster_entry_missing_from_registry() {
        let mut world = two_tribe_world();
        world.admit_new(PersonId(1), "a", Category::Male).unwrap();
        world.people.clear();
        assert!(matches!(
            world.validate(),
            Err(WorldError::InvalidState { .. })
        ));
    }

    #[test]
    fn validate_rejects_category_mismatch() {
        let mut world = two_tribe_world();
        world.admit_new(PersonId(1), "a", Category::Male).unwrap();
        if let Some(p) = world.people.get_mut(&PersonId(1)) {
            p.category = Category::Female;
        }
        assert!(world.validate().is_err());
    }

    #[test]
    fn world_state_serde_roundtrip_preserves_rosters() {
        let mut world = two_tribe_world();
        for (id, c) in [(4, Category::Female), (2, Category::Male), (8, Category::Female)] {
            world.admit_new(PersonId(id), "n", c).unwrap();
        }
        let json = serde_json::to_string(&world).unwrap();
        let restored: WorldState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, world);
        let order: Vec<u64> = restored.tribes()[0].members().iter().map(|m| m.id.0).collect();
        assert_eq!(order, vec![4, 2, 8]);
    }
}
