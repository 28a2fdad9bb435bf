//! Genesis: the fixed set of tribes a new world starts with.
//!
//! A fresh world is seeded with a small ordered list of empty tribes, two
//! by default (`Alpha` and `Bravo`), each with the same number of slots
//! per category. No tribe is created or removed afterwards.

use std::collections::BTreeSet;

use tribal_types::Category;

use crate::error::WorldError;
use crate::tribe::Tribe;
use crate::world::WorldState;

/// Tribe names used when the configuration does not list any.
pub const DEFAULT_TRIBE_NAMES: [&str; 2] = ["Alpha", "Bravo"];

/// Slots per category in each starting tribe.
pub const DEFAULT_SLOTS_PER_CATEGORY: u32 = 2;

/// Parameters for seeding a new world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartingWorld {
    /// Tribe names in fill order.
    pub tribe_names: Vec<String>,
    /// Slots reserved for each category in every tribe.
    pub slots_per_category: u32,
}

impl Default for StartingWorld {
    fn default() -> Self {
        Self {
            tribe_names: DEFAULT_TRIBE_NAMES.iter().map(|&n| n.to_owned()).collect(),
            slots_per_category: DEFAULT_SLOTS_PER_CATEGORY,
        }
    }
}

/// Create an empty world with the starting tribes.
///
/// # Errors
///
/// Returns [`WorldError::InvalidState`] if no tribe is named, a name is
/// blank or repeated, or the tribes would have no slots at all.
pub fn create_starting_world(params: &StartingWorld) -> Result<WorldState, WorldError> {
    if params.tribe_names.is_empty() {
        return Err(WorldError::InvalidState {
            reason: String::from("at least one starting tribe is required"),
        });
    }
    if params.slots_per_category == 0 {
        return Err(WorldError::InvalidState {
            reason: String::from("starting tribes need at least one slot per category"),
        });
    }

    let mut seen = BTreeSet::new();
    let mut tribes = Vec::with_capacity(params.tribe_names.len());
    for name in &params.tribe_names {
        let name = name.trim();
        if name.is_empty() {
            return Err(WorldError::InvalidState {
                reason: String::from("tribe names must not be blank"),
            });
        }
        if !seen.insert(name) {
            return Err(WorldError::InvalidState {
                reason: format!("duplicate tribe name {name}"),
            });
        }
        tribes.push(Tribe::with_uniform_capacity(name, params.slots_per_category));
    }

    tracing::debug!(
        tribes = tribes.len(),
        slots_per_category = params.slots_per_category,
        categories = Category::ALL.len(),
        "Starting tribes created"
    );

    Ok(WorldState::new(tribes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_world_has_alpha_then_bravo() {
        let world = create_starting_world(&StartingWorld::default()).unwrap();
        let names: Vec<&str> = world.tribes().iter().map(Tribe::name).collect();
        assert_eq!(names, vec!["Alpha", "Bravo"]);
        for tribe in world.tribes() {
            for &c in &Category::ALL {
                assert_eq!(tribe.capacity_for(c), DEFAULT_SLOTS_PER_CATEGORY);
            }
        }
        assert!(world.is_populating());
    }

    #[test]
    fn empty_tribe_list_is_rejected() {
        let params = StartingWorld {
            tribe_names: Vec::new(),
            ..StartingWorld::default()
        };
        assert!(create_starting_world(&params).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let params = StartingWorld {
            tribe_names: vec![String::from("Alpha"), String::from(" Alpha ")],
            ..StartingWorld::default()
        };
        assert!(create_starting_world(&params).is_err());
    }

    #[test]
    fn zero_slots_are_rejected() {
        let params = StartingWorld {
            slots_per_category: 0,
            ..StartingWorld::default()
        };
        assert!(create_starting_world(&params).is_err());
    }
}
