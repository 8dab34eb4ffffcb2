pub mod forest;
mod prefabs;

pub use prefabs::{spawn_enemy, spawn_player};
