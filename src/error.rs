// src/error.rs

use crate::types::{AccountId, Asset};
use thiserror::Error;

/// Invalid parameters. Raised at construction time; a run never starts with one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("activation rate must lie strictly between 0 and 1, got {0}")]
    ActivationRate(f64),
    #[error("time step must be positive, got {0}")]
    TimeStep(f64),
    #[error("volatility must be non-negative, got {0}")]
    Volatility(f64),
    #[error("impact decay rate must be positive, got {0}")]
    ImpactDecay(f64),
    #[error("initial price must be positive, got {0}")]
    InitialPrice(f64),
    #[error("LLTV must lie strictly between 0 and 1, got {0}")]
    Lltv(f64),
    #[error("initial LTV must lie strictly between 0 and 1, got {0}")]
    InitialLtv(f64),
    #[error("collateral amount must be positive, got {0}")]
    CollateralAmount(f64),
    #[error("health-factor threshold must be positive, got {0}")]
    HealthFactorThreshold(f64),
    #[error("number of borrow agents must be between 1 and 99, got {0}")]
    BorrowAgents(usize),
    #[error("pool fee must lie in [0, 1), got {0}")]
    PoolFee(f64),
    #[error("invalid pool liquidity ranges: {0}")]
    PoolRanges(String),
    #[error("borrow rate must be non-negative, got {0}")]
    BorrowRate(f64),
}

/// A ledger call that reverted or could not be quoted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("{account} holds {available} {asset:?} but needs {needed}")]
    InsufficientBalance {
        account: AccountId,
        asset: Asset,
        needed: f64,
        available: f64,
    },
    #[error("position of {0} is healthy")]
    HealthyPosition(AccountId),
    #[error("position of {0} would be unhealthy")]
    InsufficientCollateral(AccountId),
    #[error("cannot seize {requested} collateral from {borrower}, only {available} posted")]
    SeizeExceedsCollateral {
        borrower: AccountId,
        requested: f64,
        available: f64,
    },
    #[error("repaying {requested} shares exceeds the {available} shares owed by {borrower}")]
    RepayExceedsDebt {
        borrower: AccountId,
        requested: f64,
        available: f64,
    },
    #[error("market liquidity {available} is below the requested {requested}")]
    InsufficientLiquidity { requested: f64, available: f64 },
    #[error("swap would move the price outside the pool's liquidity range")]
    PriceOutOfRange,
    #[error("swap needs {required} against a limit of {limit}")]
    SlippageExceeded { required: f64, limit: f64 },
    #[error("cannot swap {0:?} for itself")]
    SameAsset(Asset),
    #[error("invalid amount {0}")]
    InvalidAmount(f64),
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("ledger read failed: {0}")]
    Ledger(#[from] LedgerError),
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
