//! Data types shared across the engine: story graphs, player profiles,
//! and persisted progress records.

pub mod player;
pub mod progress;
pub mod story;
