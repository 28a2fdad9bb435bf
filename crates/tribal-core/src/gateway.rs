//! The admission gateway: one ordered decision per connection attempt.
//!
//! [`AdmissionGateway::decide`] walks a fixed policy and the first branch
//! that applies wins:
//!
//! 1. A known person is welcomed back. Nothing changes.
//! 2. While the world is populating, a new person gets a category and is
//!    placed into the first open tribe, or turned away if that tribe has
//!    no room for their category.
//! 3. Once every tribe is full, the [`BirthPlacePolicy`] decides whether
//!    the newcomer is admitted without a tribe or sent to the queue.
//!
//! The gateway itself is stateless apart from its configuration. The world
//! it mutates is passed in by the caller, who is responsible for holding
//! whatever lock guards it for the whole call.

use tracing::{debug, error, info, warn};
use tribal_types::{AuthMessage, Category, PersonId};
use tribal_world::{
    BirthPlacePolicy, CategoryDraw, CategorySource, NoBirthPlaces, NoCategorySource, WorldError,
    WorldState,
};

use crate::config::TribalConfig;

/// World name used by [`AdmissionGateway::default`].
pub const DEFAULT_WORLD_NAME: &str = "Rust Tribal";

/// Queue address used by [`AdmissionGateway::default`].
pub const DEFAULT_QUEUE_URL: &str = "RustTribal.com";

/// Decides who may enter the world.
pub struct AdmissionGateway {
    world_name: String,
    queue_url: String,
    draw: CategoryDraw,
    categories: Box<dyn CategorySource>,
    birth_places: Box<dyn BirthPlacePolicy>,
}

impl std::fmt::Debug for AdmissionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGateway")
            .field("world_name", &self.world_name)
            .field("queue_url", &self.queue_url)
            .field("draw", &self.draw)
            .finish_non_exhaustive()
    }
}

impl Default for AdmissionGateway {
    fn default() -> Self {
        Self::new(DEFAULT_WORLD_NAME, DEFAULT_QUEUE_URL)
    }
}

impl AdmissionGateway {
    /// Create a gateway with no category source and no birth places.
    pub fn new(world_name: impl Into<String>, queue_url: impl Into<String>) -> Self {
        Self {
            world_name: world_name.into(),
            queue_url: queue_url.into(),
            draw: CategoryDraw::default(),
            categories: Box::new(NoCategorySource),
            birth_places: Box::new(NoBirthPlaces),
        }
    }

    /// Build a gateway from configuration. The category source still
    /// defaults to [`NoCategorySource`]; hosts that know avatars plug one in
    /// with [`with_category_source`](Self::with_category_source).
    pub fn from_config(config: &TribalConfig) -> Self {
        Self::new(&config.world.name, &config.admission.queue_url)
            .with_draw(config.category_draw())
            .with_birth_places(config.birth_place_policy())
    }

    /// Replace the fallback category draw.
    #[must_use]
    pub const fn with_draw(mut self, draw: CategoryDraw) -> Self {
        self.draw = draw;
        self
    }

    /// Replace the external category lookup.
    #[must_use]
    pub fn with_category_source(mut self, source: Box<dyn CategorySource>) -> Self {
        self.categories = source;
        self
    }

    /// Replace the overflow policy.
    #[must_use]
    pub fn with_birth_places(mut self, policy: Box<dyn BirthPlacePolicy>) -> Self {
        self.birth_places = policy;
        self
    }

    /// Server name used in welcome messages.
    pub fn world_name(&self) -> &str {
        &self.world_name
    }

    /// Category for a new identity: the host's answer if it has one,
    /// otherwise the deterministic draw.
    pub fn resolve_category(&self, id: PersonId) -> Category {
        self.draw.resolve(self.categories.as_ref(), id)
    }

    /// Decide whether `id` may enter, admitting them if so.
    ///
    /// The caller must hold exclusive access to `world` for the whole call
    /// so that the known-check and the admission happen as one step.
    pub fn decide(&self, world: &mut WorldState, id: PersonId, name: &str) -> AuthMessage {
        if world.is_alive(id) {
            debug!(person = %id, "Known person reconnecting");
            return self.welcome_back();
        }

        if world.is_known(id) {
            warn!(person = %id, "Known person is not alive, treating as known");
            return self.welcome_back();
        }

        if world.is_populating() {
            let category = self.resolve_category(id);
            match world.admit_new(id, name, category) {
                Ok(_) => return self.welcome(),
                Err(WorldError::QuotaExceeded { tribe, .. }) => {
                    let open = world
                        .current_open_tribe()
                        .map(tribal_world::Tribe::open_categories)
                        .unwrap_or_default();
                    info!(
                        person = %id,
                        category = %category,
                        tribe = %tribe,
                        "Rejected: category quota full in open tribe"
                    );
                    return AuthMessage::rejected(quota_reason(category, &open));
                }
                Err(WorldError::WorldFull) => {
                    debug!(person = %id, "Every tribe is full, trying birth places");
                }
                Err(WorldError::AlreadyKnown(_)) => {
                    warn!(person = %id, "Person already registered, treating as known");
                    return self.welcome_back();
                }
                Err(e) => {
                    error!(person = %id, error = %e, "Admission failed");
                    return self.no_spawn_points();
                }
            }
        }

        self.decide_overflow(world, id, name)
    }

    fn decide_overflow(&self, world: &mut WorldState, id: PersonId, name: &str) -> AuthMessage {
        if !self.birth_places.is_birth_place_available(world, id) {
            info!(person = %id, "Rejected: no birth place available");
            return self.no_spawn_points();
        }

        let category = self.resolve_category(id);
        match world.admit_unaffiliated(id, name, category) {
            Ok(_) => self.welcome(),
            Err(WorldError::AlreadyKnown(_)) => {
                warn!(person = %id, "Person already registered, treating as known");
                self.welcome_back()
            }
            Err(e) => {
                error!(person = %id, error = %e, "Overflow admission failed");
                self.no_spawn_points()
            }
        }
    }

    fn welcome(&self) -> AuthMessage {
        AuthMessage::accepted(format!("Welcome to {}.", self.world_name))
    }

    fn welcome_back(&self) -> AuthMessage {
        AuthMessage::accepted(format!("Welcome back to {}.", self.world_name))
    }

    fn no_spawn_points(&self) -> AuthMessage {
        AuthMessage::rejected(format!(
            "There are currently no spawn points available; join the queue at {}.",
            self.queue_url
        ))
    }
}

/// Rejection text for a closed category, naming the categories still
/// wanted, e.g. `needs more female players`.
fn quota_reason(category: Category, open: &[Category]) -> String {
    let wanted = open
        .iter()
        .copied()
        .map(Category::label)
        .collect::<Vec<_>>()
        .join(" or ");
    format!(
        "Your character is {category}. The world is still populating and needs more {wanted} \
         players; try again later."
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use tribal_types::AuthResponse;
    use tribal_world::{FixedCategory, PopulationCap, Tribe};

    use super::*;

    fn world() -> WorldState {
        WorldState::new(vec![
            Tribe::with_uniform_capacity("Alpha", 2),
            Tribe::with_uniform_capacity("Bravo", 2),
        ])
    }

    fn gateway(category: Category) -> AdmissionGateway {
        AdmissionGateway::new("Test Isle", "example.org/queue")
            .with_category_source(Box::new(FixedCategory(category)))
    }

    fn fill(world: &mut WorldState) {
        let mut next = 1000_u64;
        while world.is_populating() {
            let tribe = world.current_open_tribe().unwrap();
            let category = tribe.open_categories()[0];
            world.admit_new(PersonId(next), "filler", category).unwrap();
            next = next.saturating_add(1);
        }
    }

    #[test]
    fn new_person_is_welcomed_and_placed() {
        let mut world = world();
        let msg = gateway(Category::Female).decide(&mut world, PersonId(1), "Kora");
        assert_eq!(msg, AuthMessage::accepted("Welcome to Test Isle."));
        assert_eq!(world.tribe_name_of(PersonId(1)), Some("Alpha"));
        assert_eq!(world.find_person(PersonId(1)).unwrap().name, "Kora");
    }

    #[test]
    fn known_person_is_welcomed_back_without_mutation() {
        let mut world = world();
        let gate = gateway(Category::Female);
        gate.decide(&mut world, PersonId(1), "Kora");
        let before = world.clone();

        let msg = gate.decide(&mut world, PersonId(1), "Kora");
        assert_eq!(msg, AuthMessage::accepted("Welcome back to Test Isle."));
        assert_eq!(world, before);
    }

    #[test]
    fn known_person_is_welcomed_back_after_world_fills() {
        let mut world = world();
        let gate = gateway(Category::Male);
        gate.decide(&mut world, PersonId(1), "Kora");
        fill(&mut world);
        assert!(!world.is_populating());

        let msg = gate.decide(&mut world, PersonId(1), "Kora");
        assert!(msg.is_accepted());
        assert!(msg.reason.starts_with("Welcome back"));
    }

    #[test]
    fn known_person_marked_dead_is_welcomed_back_in_every_phase() {
        let gate = gateway(Category::Male);
        let mut world = WorldState::new(vec![Tribe::with_uniform_capacity("Alpha", 1)]);
        gate.decide(&mut world, PersonId(1), "Kora");

        let json = serde_json::to_string(&world).unwrap();
        let dead = json.replacen("\"alive\":true", "\"alive\":false", 1);
        assert_ne!(json, dead);
        let mut world: WorldState = serde_json::from_str(&dead).unwrap();
        assert!(world.is_known(PersonId(1)));
        assert!(!world.is_alive(PersonId(1)));

        let populating = gate.decide(&mut world, PersonId(1), "Kora");
        assert_eq!(populating, AuthMessage::accepted("Welcome back to Test Isle."));

        fill(&mut world);
        let before = world.clone();
        let full = gate.decide(&mut world, PersonId(1), "Kora");
        assert_eq!(full, AuthMessage::accepted("Welcome back to Test Isle."));
        assert_eq!(world, before);
    }

    #[test]
    fn closed_category_is_rejected_with_wanted_categories() {
        let mut world = world();
        let gate = gateway(Category::Male);
        assert!(gate.decide(&mut world, PersonId(1), "a").is_accepted());
        assert!(gate.decide(&mut world, PersonId(2), "b").is_accepted());

        let msg = gate.decide(&mut world, PersonId(3), "c");
        assert_eq!(msg.response, AuthResponse::Rejected);
        assert_eq!(
            msg.reason,
            "Your character is male. The world is still populating and needs more female \
             players; try again later."
        );
        assert!(!world.is_known(PersonId(3)));
    }

    #[test]
    fn full_world_without_birth_places_sends_to_queue() {
        let mut world = world();
        fill(&mut world);
        let msg = gateway(Category::Female).decide(&mut world, PersonId(1), "late");
        assert_eq!(
            msg,
            AuthMessage::rejected(
                "There are currently no spawn points available; join the queue at \
                 example.org/queue."
            )
        );
        assert!(!world.is_known(PersonId(1)));
    }

    #[test]
    fn population_cap_admits_overflow_without_tribe() {
        let mut world = world();
        fill(&mut world);
        let gate = gateway(Category::Female)
            .with_birth_places(Box::new(PopulationCap::new(world.population() + 1)));

        let msg = gate.decide(&mut world, PersonId(1), "late");
        assert_eq!(msg, AuthMessage::accepted("Welcome to Test Isle."));
        assert!(world.is_known(PersonId(1)));
        assert_eq!(world.tribe_name_of(PersonId(1)), None);

        let msg = gate.decide(&mut world, PersonId(2), "later");
        assert!(!msg.is_accepted());

        assert!(gate.decide(&mut world, PersonId(1), "late").is_accepted());
    }

    #[test]
    fn without_category_source_the_draw_decides() {
        let gate = AdmissionGateway::default().with_draw(CategoryDraw::new(7));
        let draw = CategoryDraw::new(7);
        for id in 0..32 {
            assert_eq!(gate.resolve_category(PersonId(id)), draw.draw(PersonId(id)));
        }
    }

    #[test]
    fn drawn_category_is_the_one_stored() {
        let mut world = world();
        let gate = AdmissionGateway::default();
        assert!(gate.decide(&mut world, PersonId(42), "drawn").is_accepted());
        assert_eq!(
            world.find_person(PersonId(42)).unwrap().category,
            gate.resolve_category(PersonId(42))
        );
    }

    #[test]
    fn from_config_uses_configured_names() {
        let mut config = TribalConfig::default();
        config.world.name = String::from("Elsewhere");
        let gate = AdmissionGateway::from_config(&config);
        assert_eq!(gate.world_name(), "Elsewhere");
        let mut world = world();
        assert_eq!(
            gate.decide(&mut world, PersonId(5), "x").reason,
            "Welcome to Elsewhere."
        );
    }
}
