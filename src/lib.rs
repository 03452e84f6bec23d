//! Adventure Engine — the core of a two-player choose-your-own-adventure
//! storybook.
//!
//! Walks directed story graphs (cycles and reconvergence allowed), tracks
//! visitation, persists resumable progress write-through, substitutes
//! per-player template variables, and accumulates monotonic unlock state
//! (achievements, collected endings). Rendering, animation, audio, and
//! story generation transports live in the embedding presentation layer.

pub mod core;
pub mod schema;
