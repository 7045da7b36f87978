//! Data models for the Pokédex reference dataset.
//!
//! Field names follow the snake_case JSON contract used by the dataset's clients.

mod pokemon;
mod pokemon_type;
mod skill;

pub use pokemon::*;
pub use pokemon_type::*;
pub use skill::*;
