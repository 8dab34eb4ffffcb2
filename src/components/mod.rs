mod character;
mod physics;

pub use character::*;
pub use physics::*;
