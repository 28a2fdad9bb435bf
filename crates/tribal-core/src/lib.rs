//! Admission gateway, game persistence, and host hooks for the Tribal
//! admission controller.
//!
//! This crate turns the world model of `tribal-world` into a running
//! service: it owns the persisted [`GameState`], decides every connection
//! attempt through the [`AdmissionGateway`], and exposes the host-facing
//! [`Hooks`].
//!
//! # Modules
//!
//! - [`commands`] -- Read-only player chat commands (`help`, `tribe`).
//! - [`config`] -- Configuration loading from `tribal-config.yaml` into
//!   strongly-typed structs.
//! - [`game`] -- [`GameState`]: game identity plus world, load-or-create.
//! - [`gateway`] -- [`AdmissionGateway`] and its ordered decision policy.
//! - [`host`] -- [`Hooks`] called by the host runtime.
//! - [`shared`] -- [`SharedGame`]: the locked, process-wide game.
//! - [`store`] -- [`GameStore`] trait with JSON file and memory media.

pub mod commands;
pub mod config;
pub mod game;
pub mod gateway;
pub mod host;
pub mod shared;
pub mod store;

pub use config::TribalConfig;
pub use game::GameState;
pub use gateway::AdmissionGateway;
pub use host::Hooks;
pub use shared::SharedGame;
pub use store::{GameStore, JsonFileStore, MemoryStore, PersistenceError};
