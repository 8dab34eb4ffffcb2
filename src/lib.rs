//! Combat, AI and collision core of a third-person forest brawler.
//!
//! [`sim::Simulation`] owns the world and runs every system once per tick.
//! Rendering, audio and UI live outside the crate and hear about the game
//! through [`events::Presenter`].

pub mod app;
pub mod components;
pub mod config;
pub mod effects;
pub mod engine;
pub mod events;
pub mod fsm;
pub mod logging;
pub mod obstacles;
pub mod scene;
pub mod schedule;
pub mod sim;
pub mod systems;
