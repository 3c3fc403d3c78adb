//! Core of the picture ordering game: scoring, persisted level progress and
//! the round state machine. The `orderly` binary in main.rs is a thin terminal
//! front end over these modules.

pub mod app;
pub mod assets;
pub mod config;
pub mod engine;
pub mod session;
pub mod store;
