// src/types/market.rs

use super::asset::TokenOrdering;
use serde::{Deserialize, Serialize};

/// A borrower's state in the lending market.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub borrow_shares: f64,
    pub collateral: f64,
}

/// What an observer can read from the AMM pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    /// Square root of the price of token0 in token1.
    pub sqrt_price: f64,
    /// Liquidity active at the current price.
    pub liquidity: f64,
    pub ordering: TokenOrdering,
}

impl PoolState {
    pub fn price(&self) -> f64 {
        self.sqrt_price * self.sqrt_price
    }

    pub fn collateral_price(&self) -> f64 {
        self.ordering.collateral_price(self.price())
    }
}
