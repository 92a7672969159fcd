// src/agents/liquidation_agent.rs

use super::agent_trait::{Agent, AgentRecord};
use super::config::{LIQUIDATOR_SEIZE_FRACTION, LiquidatorConfig};
use crate::error::{ConfigError, SimError};
use crate::ledger::LedgerView;
use crate::types::{AccountId, Asset, LedgerEvent, SwapKind, SwapQuery, SwapRequest, Transaction};
use rand::rngs::StdRng;

/// A borrower whose health factor fell below the scan threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub borrower: AccountId,
    pub health_factor: f64,
    pub collateral: f64,
}

/// Keeps the borrowers strictly below `threshold`, in scan order.
pub fn select_candidates(
    health_factors: &[(AccountId, f64)],
    threshold: f64,
) -> Vec<(AccountId, f64)> {
    health_factors
        .iter()
        .copied()
        .filter(|&(_, hf)| hf < threshold)
        .collect()
}

/// A liquidation pays off when buying back the repaid debt costs less
/// collateral than the liquidation seizes.
pub fn is_profitable(collateral_cost: f64, seized_collateral: f64) -> bool {
    collateral_cost < seized_collateral
}

pub struct LiquidationAgent {
    pub id: AccountId,
    borrowers: Vec<AccountId>,
    hf_threshold: f64,
    previous_debt_balance: Option<f64>,
}

impl LiquidationAgent {
    pub fn new(
        id: AccountId,
        borrowers: Vec<AccountId>,
        config: LiquidatorConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id,
            borrowers,
            hf_threshold: config.hf_threshold,
            previous_debt_balance: None,
        })
    }

    /// Reads every tracked borrower and returns those below the threshold.
    pub fn scan(&self, ledger: &dyn LedgerView) -> Result<Vec<Candidate>, SimError> {
        let mut health_factors = Vec::with_capacity(self.borrowers.len());
        for &borrower in &self.borrowers {
            health_factors.push((borrower, ledger.health_factor(borrower)?));
        }

        let mut candidates = Vec::new();
        for (borrower, health_factor) in select_candidates(&health_factors, self.hf_threshold) {
            candidates.push(Candidate {
                borrower,
                health_factor,
                collateral: ledger.position(borrower)?.collateral,
            });
        }
        Ok(candidates)
    }

    /// Dry-runs the liquidation and prices the debt buy-back on the pool.
    /// Any revert or quoting failure counts as unprofitable.
    pub fn accountability(&self, ledger: &dyn LedgerView, candidate: &Candidate) -> bool {
        let liquidation = Transaction::Liquidate {
            sender: self.id,
            borrower: candidate.borrower,
            seized_assets: candidate.collateral * LIQUIDATOR_SEIZE_FRACTION,
        };
        let events = match ledger.simulate(&liquidation) {
            Ok(events) => events,
            Err(err) => {
                log::debug!("Liquidation of {} would revert: {err}", candidate.borrower.0);
                return false;
            }
        };
        let Some((repaid_assets, seized_assets)) = events.iter().find_map(|event| match event {
            LedgerEvent::Liquidate {
                repaid_assets,
                seized_assets,
                ..
            } => Some((*repaid_assets, *seized_assets)),
            _ => None,
        }) else {
            return false;
        };

        let buy_back = SwapQuery {
            asset_in: Asset::Collateral,
            asset_out: Asset::Debt,
            kind: SwapKind::ExactOutput,
            amount: repaid_assets,
        };
        match ledger.quote(&buy_back) {
            Ok(quote) => {
                log::debug!(
                    "Liquidating {} costs {:.6} collateral for {seized_assets:.6} seized",
                    candidate.borrower.0,
                    quote.amount_in
                );
                is_profitable(quote.amount_in, seized_assets)
            }
            Err(err) => {
                log::debug!("Buy-back quote for {} failed: {err}", candidate.borrower.0);
                false
            }
        }
    }
}

impl Agent for LiquidationAgent {
    fn update(
        &mut self,
        _rng: &mut StdRng,
        ledger: &dyn LedgerView,
    ) -> Result<Vec<Transaction>, SimError> {
        let collateral_balance = ledger.balance_of(self.id, Asset::Collateral)?;
        let debt_balance = ledger.balance_of(self.id, Asset::Debt)?;

        let mut txs = Vec::new();
        for candidate in self.scan(ledger)? {
            if self.accountability(ledger, &candidate) {
                log::info!(
                    "Liquidating borrower {} at health factor {:.4}",
                    candidate.borrower.0,
                    candidate.health_factor
                );
                txs.push(Transaction::Liquidate {
                    sender: self.id,
                    borrower: candidate.borrower,
                    seized_assets: candidate.collateral * LIQUIDATOR_SEIZE_FRACTION,
                });
            }
        }

        // Buy back whatever debt asset the last step's liquidations spent.
        if let Some(previous) = self.previous_debt_balance {
            if previous > debt_balance {
                let shortfall = previous - debt_balance;
                txs.push(Transaction::Swap(
                    SwapRequest::exact_output(self.id, Asset::Debt, shortfall)
                        .with_limit(collateral_balance),
                ));
            }
        }
        self.previous_debt_balance = Some(debt_balance);

        Ok(txs)
    }

    fn record(&self, ledger: &dyn LedgerView) -> Result<AgentRecord, SimError> {
        Ok(AgentRecord::Liquidator {
            debt_balance: ledger.balance_of(self.id, Asset::Debt)?,
            collateral_balance: ledger.balance_of(self.id, Asset::Collateral)?,
        })
    }

    fn get_id(&self) -> AccountId {
        self.id
    }
}
