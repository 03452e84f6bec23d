//! Engine components: story repository, persistence store, navigation
//! reader, variable substitution, and achievement evaluation.

pub mod achievements;
pub mod reader;
pub mod repository;
pub mod store;
pub mod variables;
