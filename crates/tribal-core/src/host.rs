//! The surface the host runtime calls into.
//!
//! [`Hooks`] bundles the shared game, the gateway and the store, and maps
//! each host event onto them. Nothing here returns an error to the host:
//! failures are logged and the host carries on.

use std::sync::Arc;

use tracing::{error, info, warn};
use tribal_types::PersonId;

use crate::commands;
use crate::gateway::AdmissionGateway;
use crate::shared::SharedGame;
use crate::store::GameStore;

/// Host-facing entry points, cheap to clone into tasks.
#[derive(Clone)]
pub struct Hooks {
    game: Arc<SharedGame>,
    gateway: Arc<AdmissionGateway>,
    store: Arc<dyn GameStore>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("game_id", &self.game.game_id())
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl Hooks {
    /// Bundle the process-wide game, gateway and store.
    pub const fn new(
        game: Arc<SharedGame>,
        gateway: Arc<AdmissionGateway>,
        store: Arc<dyn GameStore>,
    ) -> Self {
        Self {
            game,
            gateway,
            store,
        }
    }

    /// The shared game.
    pub const fn game(&self) -> &Arc<SharedGame> {
        &self.game
    }

    /// A client is trying to connect.
    ///
    /// Returns `None` to let the connection through, or the reason to show
    /// the client when it is refused.
    pub fn on_connect_attempt(&self, id: PersonId, name: &str) -> Option<String> {
        let decision = self.game.decide(&self.gateway, id, name);
        info!(person = %id, name = name, decision = %decision.summary(), "Connection attempt");
        if decision.is_accepted() {
            None
        } else {
            Some(decision.reason)
        }
    }

    /// A client finished connecting.
    ///
    /// Admission already happened in [`on_connect_attempt`](Self::on_connect_attempt),
    /// so a known person is only logged. An identity the gate never saw is
    /// decided now.
    pub fn on_player_connected(&self, id: PersonId, name: &str) {
        let known = self.game.read(|game| {
            let world = game.world();
            world.person(id).map(|person| {
                (
                    person.category,
                    world.tribe_name_of(id).unwrap_or(commands::NO_TRIBE).to_owned(),
                )
            })
        });

        match known {
            Ok((category, tribe)) => {
                info!(
                    person = %id,
                    name = name,
                    category = %category,
                    tribe = %tribe,
                    "Player connected"
                );
            }
            Err(e) => {
                warn!(
                    person = %id,
                    error = %e,
                    "Connected player was never admitted, deciding now"
                );
                let decision = self.game.decide(&self.gateway, id, name);
                info!(person = %id, decision = %decision.summary(), "Late admission decided");
            }
        }
    }

    /// A player issued a chat command line such as `tribe -name`.
    pub fn on_chat_command(&self, id: PersonId, line: &str) -> Option<String> {
        let mut words = line.split_whitespace();
        let command = words.next()?;
        let args: Vec<&str> = words.collect();
        self.game
            .read(|game| commands::respond(game.world(), id, command, &args))
    }

    /// The server finished loading. Saves once so a fresh world is on disk
    /// before anyone connects. Returns whether the save succeeded.
    pub fn on_startup(&self) -> bool {
        self.save("startup")
    }

    /// The host's periodic save signal. Returns whether the save succeeded.
    pub fn on_periodic_save(&self) -> bool {
        self.save("periodic")
    }

    /// The host is shutting down. Returns whether the final save succeeded.
    pub fn on_shutdown(&self) -> bool {
        self.save("shutdown")
    }

    /// Save on an explicit request. Returns whether the save succeeded.
    pub fn on_save_requested(&self) -> bool {
        self.save("requested")
    }

    fn save(&self, trigger: &str) -> bool {
        match self.game.save(self.store.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                error!(trigger = trigger, error = %e, "Failed to save game");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tribal_types::Category;
    use tribal_world::{FixedCategory, StartingWorld};

    use super::*;
    use crate::game::GameState;
    use crate::store::{MemoryStore, PersistenceError};

    struct FailingStore;

    impl GameStore for FailingStore {
        fn load(&self) -> Result<Option<GameState>, PersistenceError> {
            Ok(None)
        }

        fn save(&self, _game: &GameState) -> Result<(), PersistenceError> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    fn hooks(store: Arc<dyn GameStore>) -> Hooks {
        let game = GameState::new(&StartingWorld::default()).unwrap();
        let gateway = AdmissionGateway::new("Isle", "q.example")
            .with_category_source(Box::new(FixedCategory(Category::Male)));
        Hooks::new(Arc::new(SharedGame::new(game)), Arc::new(gateway), store)
    }

    #[test]
    fn accepted_attempt_returns_none() {
        let hooks = hooks(Arc::new(MemoryStore::new()));
        assert_eq!(hooks.on_connect_attempt(PersonId(1), "a"), None);
    }

    #[test]
    fn rejected_attempt_returns_reason() {
        let hooks = hooks(Arc::new(MemoryStore::new()));
        hooks.on_connect_attempt(PersonId(1), "a");
        hooks.on_connect_attempt(PersonId(2), "b");
        let reason = hooks.on_connect_attempt(PersonId(3), "c").unwrap();
        assert!(reason.contains("still populating"));
    }

    #[test]
    fn connected_without_attempt_is_admitted() {
        let hooks = hooks(Arc::new(MemoryStore::new()));
        hooks.on_player_connected(PersonId(9), "skipped");
        assert!(hooks.game().read(|g| g.world().is_known(PersonId(9))));

        hooks.on_player_connected(PersonId(9), "skipped");
        assert_eq!(hooks.game().read(|g| g.world().population()), 1);
    }

    #[test]
    fn chat_command_reads_tribe_name() {
        let hooks = hooks(Arc::new(MemoryStore::new()));
        hooks.on_connect_attempt(PersonId(1), "a");
        assert_eq!(
            hooks.on_chat_command(PersonId(1), "tribe  -name").as_deref(),
            Some("Tribe Name: Alpha")
        );
        assert_eq!(hooks.on_chat_command(PersonId(1), "   "), None);
    }

    /// Counts events at warn level or above.
    #[derive(Clone, Default)]
    struct WarnCounter(Arc<std::sync::atomic::AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() <= tracing::Level::WARN {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn failed_save_is_logged_once() {
        use tracing_subscriber::layer::SubscriberExt;

        let counter = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());
        let failing = hooks(Arc::new(FailingStore));

        tracing::subscriber::with_default(subscriber, || {
            assert!(!failing.on_save_requested());
        });
        assert_eq!(counter.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn saves_report_success_and_failure() {
        let store = Arc::new(MemoryStore::new());
        let ok = hooks(Arc::clone(&store) as Arc<dyn GameStore>);
        assert!(ok.on_startup());
        assert!(store.bytes().is_some());
        assert!(ok.on_save_requested());

        let failing = hooks(Arc::new(FailingStore));
        assert!(!failing.on_periodic_save());
        assert!(!failing.on_shutdown());
    }
}
