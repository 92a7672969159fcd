// src/types/asset.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger account. Rendered the way the ledger renders integer-derived addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:040x}", self.0)
    }
}

/// The two tokens of the simulated market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The risky asset posted as collateral (e.g. WETH).
    Collateral,
    /// The numeraire that is lent out (e.g. DAI).
    Debt,
}

impl Asset {
    pub fn other(self) -> Asset {
        match self {
            Asset::Collateral => Asset::Debt,
            Asset::Debt => Asset::Collateral,
        }
    }
}

/// Which asset the AMM pool treats as token0. Pool prices are always
/// quoted as token0 in terms of token1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenOrdering {
    CollateralIsToken0,
    DebtIsToken0,
}

impl TokenOrdering {
    pub fn token0(self) -> Asset {
        match self {
            TokenOrdering::CollateralIsToken0 => Asset::Collateral,
            TokenOrdering::DebtIsToken0 => Asset::Debt,
        }
    }

    pub fn token1(self) -> Asset {
        self.token0().other()
    }

    /// Converts a pool price (token0 in token1) into the collateral price in debt units.
    pub fn collateral_price(self, pool_price: f64) -> f64 {
        match self {
            TokenOrdering::CollateralIsToken0 => pool_price,
            TokenOrdering::DebtIsToken0 => 1.0 / pool_price,
        }
    }
}
