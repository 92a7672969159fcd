// src/ledger/mod.rs

//! Capability interface to the ledger/contract environment.
//!
//! Agents only ever see a `&dyn LedgerView`: balances, the oracle, the
//! lending market and the AMM pool, each behind its own small trait. The
//! simulation clock holds the mutating [`Ledger`] and is the only caller of
//! [`Ledger::submit`].

pub mod lending;
pub mod memory;
pub mod pool;
pub mod snapshot;

use crate::error::LedgerError;
use crate::types::{
    AccountId, Asset, LedgerEvent, PoolState, Position, Quote, SwapQuery, Transaction,
};

pub use lending::{MarketState, NO_DEBT_HEALTH_FACTOR};
pub use memory::InMemoryLedger;
pub use pool::{ConcentratedPool, LiquidityRange};
pub use snapshot::LedgerSnapshot;

pub trait TokenBalances {
    fn balance_of(&self, account: AccountId, asset: Asset) -> Result<f64, LedgerError>;
}

pub trait PriceOracle {
    /// Collateral price in debt units.
    fn price(&self) -> Result<f64, LedgerError>;
}

pub trait LendingMarket {
    fn lltv(&self) -> f64;
    fn position(&self, account: AccountId) -> Result<Position, LedgerError>;
    /// Debt of `account` converted from shares to assets.
    fn borrow_assets(&self, account: AccountId) -> Result<f64, LedgerError>;
    fn health_factor(&self, account: AccountId) -> Result<f64, LedgerError>;
}

pub trait SwapPool {
    fn pool_state(&self) -> Result<PoolState, LedgerError>;
    /// Pure quote: nothing changes on the pool.
    fn quote(&self, query: &SwapQuery) -> Result<Quote, LedgerError>;
}

/// Read-only access, plus dry runs of transactions.
pub trait LedgerView: TokenBalances + PriceOracle + LendingMarket + SwapPool {
    fn block_number(&self) -> u64;
    /// Runs `tx` against a throwaway copy of the state.
    fn simulate(&self, tx: &Transaction) -> Result<Vec<LedgerEvent>, LedgerError>;
}

pub trait Ledger: LedgerView {
    /// Applies `tx` atomically: on error nothing changed.
    fn submit(&mut self, tx: &Transaction) -> Result<Vec<LedgerEvent>, LedgerError>;
    fn advance_block(&mut self);
}
