// src/agents/borrow_agent.rs

use super::agent_trait::{Agent, AgentRecord};
use super::config::{BORROW_LTV_JITTER_MAX, BORROW_LTV_JITTER_MIN, BorrowerConfig};
use crate::error::{ConfigError, SimError};
use crate::ledger::LedgerView;
use crate::types::{AccountId, Transaction};
use rand::Rng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowerState {
    NotSupplied,
    Supplied,
    Borrowed,
}

/// Supplies collateral once, then borrows once, each step only with
/// probability `activation_rate`.
pub struct BorrowAgent {
    pub id: AccountId,
    config: BorrowerConfig,
    state: BorrowerState,
    step: u64,
}

impl BorrowAgent {
    pub fn new(id: AccountId, config: BorrowerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            config,
            state: BorrowerState::NotSupplied,
            step: 0,
        })
    }

    pub fn state(&self) -> BorrowerState {
        self.state
    }

    pub fn has_supplied(&self) -> bool {
        self.state != BorrowerState::NotSupplied
    }

    pub fn has_borrowed(&self) -> bool {
        self.state == BorrowerState::Borrowed
    }
}

impl Agent for BorrowAgent {
    fn update(
        &mut self,
        rng: &mut StdRng,
        ledger: &dyn LedgerView,
    ) -> Result<Vec<Transaction>, SimError> {
        self.step += 1;
        // Drawn every step so the stream consumed by later agents does not
        // depend on this agent's state.
        let draw: f64 = rng.gen_range(0.0..1.0);
        if draw >= self.config.activation_rate {
            return Ok(vec![]);
        }

        match self.state {
            BorrowerState::NotSupplied => {
                self.state = BorrowerState::Supplied;
                Ok(vec![Transaction::SupplyCollateral {
                    sender: self.id,
                    amount: self.config.collateral_amount,
                }])
            }
            BorrowerState::Supplied => {
                let price = ledger.price()?;
                let u = rng.gen_range(BORROW_LTV_JITTER_MIN..BORROW_LTV_JITTER_MAX);
                let amount = u * price * self.config.collateral_amount * self.config.initial_ltv;
                self.state = BorrowerState::Borrowed;
                log::debug!("Borrower {} borrows {amount:.2} at price {price:.2}", self.id.0);
                Ok(vec![Transaction::Borrow {
                    sender: self.id,
                    amount,
                }])
            }
            BorrowerState::Borrowed => Ok(vec![]),
        }
    }

    fn record(&self, ledger: &dyn LedgerView) -> Result<AgentRecord, SimError> {
        Ok(AgentRecord::Borrower {
            step: self.step,
            health_factor: ledger.health_factor(self.id)?,
            debt_assets: ledger.borrow_assets(self.id)?,
            collateral_assets: ledger.position(self.id)?.collateral,
            oracle_price: ledger.price()?,
        })
    }

    fn get_id(&self) -> AccountId {
        self.id
    }
}
