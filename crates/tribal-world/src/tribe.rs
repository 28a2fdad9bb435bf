//! Tribes: fixed-capacity rosters with a per-category quota.
//!
//! A [`Tribe`] reserves a number of slots for each [`Category`]. While any
//! category still has room the tribe is open and takes new members in join
//! order. The roster only holds back-references (id and category) to the
//! records owned by the world registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tribal_types::{Category, PersonId, PersonRecord};

use crate::error::WorldError;

/// One roster entry: who joined and which quota they count against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeMember {
    /// Identity of the member.
    pub id: PersonId,
    /// Category the member was admitted under.
    pub category: Category,
}

/// A cohort of admitted persons with a fixed per-category capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tribe {
    /// Display name, unique within a world.
    name: String,
    /// Slots per category. Categories missing from the map have no slots.
    capacity: BTreeMap<Category, u32>,
    /// Members in join order.
    members: Vec<TribeMember>,
}

impl Tribe {
    /// Create an empty tribe with the given per-category capacity.
    pub fn new(name: impl Into<String>, capacity: BTreeMap<Category, u32>) -> Self {
        Self {
            name: name.into(),
            capacity,
            members: Vec::new(),
        }
    }

    /// Create an empty tribe with the same number of slots for every category.
    pub fn with_uniform_capacity(name: impl Into<String>, slots: u32) -> Self {
        Self::new(name, Category::ALL.iter().map(|&c| (c, slots)).collect())
    }

    /// The tribe's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in join order.
    pub fn members(&self) -> &[TribeMember] {
        &self.members
    }

    /// Number of members across all categories.
    pub fn size(&self) -> u32 {
        u32::try_from(self.members.len()).unwrap_or(u32::MAX)
    }

    /// Slots reserved for `category`.
    pub fn capacity_for(&self, category: Category) -> u32 {
        self.capacity.get(&category).copied().unwrap_or(0)
    }

    /// Members currently counted against `category`.
    pub fn count(&self, category: Category) -> u32 {
        let n = self
            .members
            .iter()
            .filter(|m| m.category == category)
            .count();
        u32::try_from(n).unwrap_or(u32::MAX)
    }

    /// Free slots left for `category`.
    pub fn remaining(&self, category: Category) -> u32 {
        self.capacity_for(category).saturating_sub(self.count(category))
    }

    /// Whether another member of `category` fits.
    pub fn is_category_open(&self, category: Category) -> bool {
        self.count(category) < self.capacity_for(category)
    }

    /// Whether any category still has room.
    pub fn is_open(&self) -> bool {
        Category::ALL.iter().any(|&c| self.is_category_open(c))
    }

    /// Categories that still have room, in [`Category::ALL`] order.
    pub fn open_categories(&self) -> Vec<Category> {
        Category::ALL
            .iter()
            .copied()
            .filter(|&c| self.is_category_open(c))
            .collect()
    }

    /// Whether the identity is on this tribe's roster.
    pub fn contains(&self, id: PersonId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Append a registered person to the roster.
    ///
    /// The caller must already have registered `person` in the world
    /// registry; the roster only stores a back-reference.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AlreadyKnown`] if the person is already a
    /// member, or [`WorldError::QuotaExceeded`] if the person's category
    /// has no free slot.
    pub fn add(&mut self, person: &PersonRecord) -> Result<(), WorldError> {
        if self.contains(person.id) {
            return Err(WorldError::AlreadyKnown(person.id));
        }
        if !self.is_category_open(person.category) {
            return Err(WorldError::QuotaExceeded {
                tribe: self.name.clone(),
                category: person.category,
                capacity: self.capacity_for(person.category),
            });
        }
        self.members.push(TribeMember {
            id: person.id,
            category: person.category,
        });
        Ok(())
    }
}
