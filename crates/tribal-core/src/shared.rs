//! The process-wide game behind a lock.
//!
//! [`SharedGame`] is created once by the entry point and handed to every
//! hook as an `Arc<SharedGame>`. Admission takes the write lock for the
//! whole decision, so at most one admission is in flight. Queries and
//! saves take the read lock; a save only holds it long enough to clone the
//! state and serializes the copy afterwards.
//!
//! A poisoned lock is recovered rather than propagated. Every mutation of
//! the world is a single step that either fully happens or not at all, so
//! the data behind a poisoned lock is still consistent.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;
use tribal_types::{AuthMessage, GameId, PersonId};

use crate::game::GameState;
use crate::gateway::AdmissionGateway;
use crate::store::{GameStore, PersistenceError};

/// The one game of this process, shared between hooks.
#[derive(Debug)]
pub struct SharedGame {
    state: RwLock<GameState>,
    game_id: GameId,
}

impl SharedGame {
    /// Wrap a loaded or freshly created game.
    pub const fn new(game: GameState) -> Self {
        Self {
            game_id: game.game_id(),
            state: RwLock::new(game),
        }
    }

    /// The game's identity. Never changes, so no lock is taken.
    pub const fn game_id(&self) -> GameId {
        self.game_id
    }

    /// Run the admission decision for `id` under the write lock.
    pub fn decide(&self, gateway: &AdmissionGateway, id: PersonId, name: &str) -> AuthMessage {
        let mut game = self.write();
        gateway.decide(game.world_mut(), id, name)
    }

    /// Run a read-only query against the game.
    pub fn read<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&self.read_guard())
    }

    /// A copy of the current game.
    pub fn snapshot(&self) -> GameState {
        self.read_guard().clone()
    }

    /// Copy the game under the read lock, then write the copy to `store`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the store fails.
    pub fn save(&self, store: &dyn GameStore) -> Result<(), PersistenceError> {
        let snapshot = self.snapshot();
        snapshot.save(store)?;
        info!(
            game_id = %self.game_id,
            population = snapshot.world().population(),
            "Game saved"
        );
        Ok(())
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, GameState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, GameState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tribal_types::Category;
    use tribal_world::{FixedCategory, StartingWorld};

    use super::*;
    use crate::store::MemoryStore;

    fn shared() -> SharedGame {
        SharedGame::new(GameState::new(&StartingWorld::default()).unwrap())
    }

    #[test]
    fn decide_mutates_shared_world() {
        let game = shared();
        let gate = AdmissionGateway::default();
        assert!(game.decide(&gate, PersonId(7), "Tam").is_accepted());
        assert!(game.read(|g| g.world().is_known(PersonId(7))));
    }

    #[test]
    fn snapshot_is_detached_from_later_admissions() {
        let game = shared();
        let gate = AdmissionGateway::default();
        let before = game.snapshot();
        game.decide(&gate, PersonId(7), "Tam");
        assert!(!before.world().is_known(PersonId(7)));
        assert_eq!(before.game_id(), game.game_id());
    }

    #[test]
    fn save_writes_current_state() {
        let game = shared();
        let gate = AdmissionGateway::default();
        game.decide(&gate, PersonId(7), "Tam");

        let store = MemoryStore::new();
        game.save(&store).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.world().is_known(PersonId(7)));
        assert_eq!(loaded.game_id(), game.game_id());
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let game = Arc::new(shared());
        let gate = AdmissionGateway::new("Isle", "q")
            .with_category_source(Box::new(FixedCategory(Category::Female)));

        let poisoner = Arc::clone(&game);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.write();
            std::panic::panic_any("poison the lock");
        })
        .join();
        assert!(result.is_err());

        assert!(game.decide(&gate, PersonId(1), "after").is_accepted());
        assert_eq!(game.read(|g| g.world().population()), 1);
    }
}
