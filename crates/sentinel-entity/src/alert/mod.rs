//! Alert entity: row model and the typed rules it carries.

pub mod model;
pub mod rules;

pub use model::Alert;
pub use rules::{AlertRules, Direction};
