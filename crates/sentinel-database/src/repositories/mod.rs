//! Concrete repository implementations, one per aggregate.

pub mod alert;
pub mod notification;
pub mod wallet;
