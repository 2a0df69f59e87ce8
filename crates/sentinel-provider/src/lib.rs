//! # sentinel-provider
//!
//! Client for the external portfolio data provider. The monitor consumes
//! it through the [`PortfolioSource`] trait so evaluation cycles can be
//! tested against canned data.

pub mod client;
pub mod types;

pub use client::{PortfolioClient, PortfolioSource};
pub use types::{PortfolioBalance, TokenBalance};
