// src/agents/agent_trait.rs

use crate::error::SimError;
use crate::ledger::LedgerView;
use crate::types::{AccountId, Transaction};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Read-only metrics an agent reports once per step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentRecord {
    MarketMaker {
        /// Pool price of token0 in token1.
        pool_price: f64,
        /// External price in the same orientation.
        external_price: f64,
    },
    Borrower {
        step: u64,
        health_factor: f64,
        debt_assets: f64,
        collateral_assets: f64,
        oracle_price: f64,
    },
    Liquidator {
        debt_balance: f64,
        collateral_balance: f64,
    },
}

/// The core trait that all our participant types will implement.
pub trait Agent {
    /// Reads the start-of-step ledger state and returns the transactions the
    /// agent wants submitted this step.
    fn update(&mut self, rng: &mut StdRng, ledger: &dyn LedgerView)
    -> Result<Vec<Transaction>, SimError>;

    /// Must not change any state, the agent's included.
    fn record(&self, ledger: &dyn LedgerView) -> Result<AgentRecord, SimError>;

    fn get_id(&self) -> AccountId;
}
