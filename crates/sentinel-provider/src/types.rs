//! Portfolio balance wire types.

use serde::{Deserialize, Serialize};

/// One token position inside a portfolio.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token contract address.
    #[serde(default)]
    pub address: Option<String>,
    /// Token symbol (e.g. "ETH").
    #[serde(default)]
    pub symbol: String,
    /// Token decimals.
    #[serde(default)]
    pub decimals: Option<u8>,
    /// Raw balance in base units, as a string to avoid precision loss.
    #[serde(default)]
    pub balance: Option<String>,
    /// USD value of the position, absent when the provider has no price.
    #[serde(default)]
    pub usd: Option<f64>,
}

/// Portfolio balance for one address across all supported chains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioBalance {
    /// USD value of the native coin position, as a decimal string.
    #[serde(default)]
    pub native: Option<String>,
    /// All token positions.
    #[serde(default)]
    pub tokens: Vec<TokenBalance>,
}

impl PortfolioBalance {
    /// Find a token by symbol, case-insensitively.
    pub fn find_token(&self, symbol: &str) -> Option<&TokenBalance> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Total portfolio value in USD: native plus every token position.
    ///
    /// Unparseable native values and unpriced tokens count as zero.
    pub fn total_usd(&self) -> f64 {
        let native = self
            .native
            .as_deref()
            .and_then(|n| n.parse::<f64>().ok())
            .unwrap_or(0.0);

        native + self.tokens.iter().filter_map(|t| t.usd).sum::<f64>()
    }
}
