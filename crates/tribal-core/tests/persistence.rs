//! Persistence tests against the JSON file store.
//!
//! Files are written under the system temp directory, one fresh directory
//! per test, and removed at the end.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::PathBuf;

use tribal_core::{AdmissionGateway, GameState, GameStore, JsonFileStore, SharedGame};
use tribal_types::{Category, PersonId};
use tribal_world::{FixedCategory, StartingWorld};

struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("tribal-{tag}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn file(&self) -> PathBuf {
        self.0.join("tribal_game_data.json")
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn populated_game() -> SharedGame {
    let game = SharedGame::new(GameState::new(&StartingWorld::default()).unwrap());
    let gate = AdmissionGateway::default()
        .with_category_source(Box::new(FixedCategory(Category::Female)));
    for id in [40, 10, 30] {
        game.decide(&gate, PersonId(id), &format!("p{id}"));
    }
    game
}

#[test]
fn roster_order_and_identity_survive_reload() {
    let dir = TempDir::new("order");
    let store = JsonFileStore::new(dir.file());
    let game = populated_game();
    game.save(&store).unwrap();

    let loaded = GameState::load_or_create(&store, &StartingWorld::default()).unwrap();
    assert_eq!(loaded.game_id(), game.game_id());
    assert_eq!(loaded, game.snapshot());

    let alpha: Vec<u64> = loaded.world().tribes()[0]
        .members()
        .iter()
        .map(|m| m.id.0)
        .collect();
    assert_eq!(alpha, vec![40, 10]);
    assert_eq!(loaded.world().tribe_name_of(PersonId(30)), None);
    assert!(!loaded.world().is_known(PersonId(30)));
}

#[test]
fn saving_twice_writes_identical_bytes() {
    let dir = TempDir::new("idempotent");
    let store = JsonFileStore::new(dir.file());
    let game = populated_game();

    game.save(&store).unwrap();
    let first = std::fs::read(dir.file()).unwrap();
    game.save(&store).unwrap();
    let second = std::fs::read(dir.file()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn corrupt_file_falls_back_to_fresh_world() {
    let dir = TempDir::new("corrupt");
    std::fs::write(dir.file(), b"{\"game_id\": 12").unwrap();
    let store = JsonFileStore::new(dir.file());

    let game = GameState::load_or_create(&store, &StartingWorld::default()).unwrap();
    assert_eq!(game.world().population(), 0);
    assert!(game.world().is_populating());

    game.save(&store).unwrap();
    assert!(store.load().unwrap().is_some());
}

#[test]
fn corrupt_file_is_kept_aside_past_the_next_save() {
    let dir = TempDir::new("aside");
    let corrupt = b"{\"game_id\": 12";
    std::fs::write(dir.file(), corrupt).unwrap();
    let store = JsonFileStore::new(dir.file());

    let game = GameState::load_or_create(&store, &StartingWorld::default()).unwrap();
    game.save(&store).unwrap();

    let aside = dir.0.join(format!("tribal_game_data.json.corrupt-{}", game.game_id()));
    assert_eq!(std::fs::read(&aside).unwrap(), corrupt);
    assert_eq!(
        store.load().unwrap().map(|g| g.game_id()),
        Some(game.game_id())
    );
}

#[test]
fn inconsistent_world_is_rejected_on_load() {
    let dir = TempDir::new("inconsistent");
    let store = JsonFileStore::new(dir.file());
    populated_game().save(&store).unwrap();

    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.file()).unwrap()).unwrap();
    doc["world"]["people"] = serde_json::json!({});
    std::fs::write(dir.file(), serde_json::to_vec(&doc).unwrap()).unwrap();

    assert!(store.load().is_err());
    let game = GameState::load_or_create(&store, &StartingWorld::default()).unwrap();
    assert_eq!(game.world().population(), 0);
}

#[test]
fn persisted_layout_uses_documented_keys() {
    let dir = TempDir::new("layout");
    let store = JsonFileStore::new(dir.file());
    populated_game().save(&store).unwrap();

    let doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.file()).unwrap()).unwrap();
    assert!(doc["game_id"].is_string());
    assert_eq!(doc["world"]["people"]["40"]["name"], "p40");
    assert_eq!(doc["world"]["people"]["40"]["category"], "Female");
    assert_eq!(doc["world"]["tribes"][0]["name"], "Alpha");
    assert_eq!(doc["world"]["tribes"][0]["capacity"]["Male"], 2);
    assert_eq!(doc["world"]["tribes"][0]["members"][1]["id"], 10);
}
