//! HTTP client for the portfolio data provider.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use sentinel_core::config::provider::ProviderConfig;
use sentinel_core::error::{AppError, ErrorKind};
use sentinel_core::result::AppResult;

use crate::types::PortfolioBalance;

/// Source of live portfolio data.
///
/// The monitor depends on this trait rather than the concrete client so
/// cycles can run against canned balances in tests.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    /// Fetch the portfolio balance for an address across all supported
    /// chains.
    async fn portfolio_balance(&self, address: &str) -> AppResult<PortfolioBalance>;
}

/// reqwest-backed portfolio provider client.
///
/// Every transport, status, or decoding failure surfaces as a single
/// `ExternalService` error so callers treat the provider as one fallible
/// collaborator.
#[derive(Debug, Clone)]
pub struct PortfolioClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PortfolioClient {
    /// Build a client from configuration. The timeout applies per request.
    pub fn new(config: &ProviderConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    format!("Failed to build provider HTTP client: {e}"),
                    e,
                )
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl PortfolioSource for PortfolioClient {
    async fn portfolio_balance(&self, address: &str) -> AppResult<PortfolioBalance> {
        let url = format!("{}/api/portfolio/balances", self.base_url);
        debug!(address = %address, "Fetching portfolio balance");

        let response = self
            .http
            .get(&url)
            .query(&[("address", address)])
            .header("X-API-Key", self.api_key.as_str())
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Portfolio provider request failed: {e}"),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Portfolio provider returned {status} for {address}"
            )));
        }

        response.json::<PortfolioBalance>().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Failed to decode portfolio response: {e}"),
                e,
            )
        })
    }
}
