// src/agents/market_maker_agent.rs

use super::agent_trait::{Agent, AgentRecord};
use super::agent_type::MarketMakerMode;
use super::config::MarketMakerConfig;
use crate::error::SimError;
use crate::ledger::LedgerView;
use crate::simulators::gbm::ExternalMarket;
use crate::simulators::price_matching::PriceMatchingSolver;
use crate::types::{AccountId, TokenOrdering, Transaction};
use rand::rngs::StdRng;

/// Arbitrageur between the AMM pool and an external GBM market. Each step it
/// feeds the pool/external divergence back as transient impact, advances the
/// external market and trades the pool onto the new external price.
pub struct MarketMakerAgent {
    pub id: AccountId,
    external_market: ExternalMarket,
    solver: PriceMatchingSolver,
    ordering: TokenOrdering,
    mode: MarketMakerMode,
    step: u64,
}

impl MarketMakerAgent {
    /// The external market starts at the pool's current price.
    pub fn new(
        id: AccountId,
        config: &MarketMakerConfig,
        ledger: &dyn LedgerView,
    ) -> Result<Self, SimError> {
        let pool = ledger.pool_state()?;
        let external_market = ExternalMarket::new(
            pool.collateral_price(),
            config.drift,
            config.volatility,
            config.dt,
            config.impact_decay,
            config.impact_scale,
        )?;
        Ok(Self {
            id,
            external_market,
            solver: PriceMatchingSolver::new(config.exact, config.max_iterations),
            ordering: pool.ordering,
            mode: config.mode,
            step: 0,
        })
    }

    pub fn external_market(&self) -> &ExternalMarket {
        &self.external_market
    }

    /// External sqrt price in the pool's orientation (token0 in token1).
    fn target_sqrt_price(&self) -> f64 {
        match self.ordering {
            TokenOrdering::CollateralIsToken0 => self.external_market.sqrt_price_risky(),
            TokenOrdering::DebtIsToken0 => self.external_market.sqrt_price_numeraire(),
        }
    }
}

impl Agent for MarketMakerAgent {
    fn update(
        &mut self,
        rng: &mut StdRng,
        ledger: &dyn LedgerView,
    ) -> Result<Vec<Transaction>, SimError> {
        let pool = ledger.pool_state()?;

        if self.step > 0 {
            let observed = pool.collateral_price() - self.external_market.price_with_impact();
            self.external_market.impact_decay(observed);
        }
        self.external_market.advance(rng);

        let target = self.target_sqrt_price();
        let request = self.solver.solve(self.id, &pool, target, ledger);
        self.step += 1;

        if let MarketMakerMode::ExploratoryDriftFlip { n_steps } = self.mode {
            if self.step == n_steps / 4 || self.step == 3 * n_steps / 4 {
                let drift = self.external_market.drift();
                self.external_market.set_drift(-drift);
                log::debug!("Drift flipped to {} at step {}", -drift, self.step);
            }
        }

        Ok(request.map(Transaction::Swap).into_iter().collect())
    }

    fn record(&self, ledger: &dyn LedgerView) -> Result<AgentRecord, SimError> {
        let pool = ledger.pool_state()?;
        Ok(AgentRecord::MarketMaker {
            pool_price: pool.price(),
            external_price: self.target_sqrt_price().powi(2),
        })
    }

    fn get_id(&self) -> AccountId {
        self.id
    }
}
