//! The game: one world plus the identity it keeps across restarts.
//!
//! A [`GameState`] is created once, the first time the server starts with
//! nothing saved, and reloaded on every later start. It is saved at
//! startup, on the periodic save signal, and at shutdown.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tribal_types::GameId;
use tribal_world::{StartingWorld, WorldError, WorldState, create_starting_world};

use crate::store::{GameStore, PersistenceError};

/// The persisted root: game identity and world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Generated at creation, never changed afterwards.
    game_id: GameId,
    /// The world. Owned exclusively by the game.
    world: WorldState,
}

impl GameState {
    /// Create a fresh game with a new id and the starting tribes.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidState`] if the starting parameters do
    /// not describe a usable world.
    pub fn new(starting: &StartingWorld) -> Result<Self, WorldError> {
        Ok(Self::from_parts(GameId::new(), create_starting_world(starting)?))
    }

    /// Assemble a game from an existing id and world.
    pub const fn from_parts(game_id: GameId, world: WorldState) -> Self {
        Self { game_id, world }
    }

    /// The game's identity.
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// The world.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// The world, for admission mutations.
    pub const fn world_mut(&mut self) -> &mut WorldState {
        &mut self.world
    }

    /// Encode the whole game as pretty JSON.
    ///
    /// Maps are ordered, so encoding the same state twice gives the same
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] if encoding fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, PersistenceError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Decode a game and check that its world is consistent.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Json`] for malformed bytes and
    /// [`PersistenceError::Invalid`] if the registry and rosters disagree.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, PersistenceError> {
        let game: Self = serde_json::from_slice(bytes)?;
        game.world.validate()?;
        Ok(game)
    }

    /// Load the stored game, or create a fresh one if nothing usable is
    /// stored.
    ///
    /// A store that fails or holds an unusable document is logged and the
    /// stored game is set aside under a name tagged with the new game's id,
    /// so the next save does not destroy it. It never stops the server from
    /// starting.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidState`] only if a fresh world has to be
    /// created and `starting` is unusable.
    pub fn load_or_create(
        store: &dyn GameStore,
        starting: &StartingWorld,
    ) -> Result<Self, WorldError> {
        let mut load_failed = false;
        match store.load() {
            Ok(Some(game)) => {
                info!(
                    game_id = %game.game_id,
                    population = game.world.population(),
                    populating = game.world.is_populating(),
                    "Game loaded"
                );
                return Ok(game);
            }
            Ok(None) => {
                info!("No saved game found, creating a new one");
            }
            Err(e) => {
                error!(error = %e, "Failed to load saved game, creating a new one");
                load_failed = true;
            }
        }

        let game = Self::new(starting)?;
        if load_failed {
            match store.set_aside(&game.game_id.to_string()) {
                Ok(Some(place)) => warn!(moved_to = %place, "Unusable saved game moved aside"),
                Ok(None) => {}
                Err(e) => error!(error = %e, "Failed to move unusable saved game aside"),
            }
        }
        info!(
            game_id = %game.game_id,
            tribes = game.world.tribes().len(),
            "New game created"
        );
        Ok(game)
    }

    /// Write the game to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the store fails.
    pub fn save(&self, store: &dyn GameStore) -> Result<(), PersistenceError> {
        store.save(self)
    }
}
