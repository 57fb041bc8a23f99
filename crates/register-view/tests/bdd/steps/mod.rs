//! BDD step definitions for the register view-model

pub mod edit_steps;
pub mod snapshot_steps;
