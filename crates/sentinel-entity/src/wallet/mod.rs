//! Wallet entity.

pub mod model;

pub use model::Wallet;
