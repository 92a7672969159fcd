// src/config.rs

use crate::agents::config::{
    BORROW_RATE_PER_BLOCK, BorrowerConfig, INITIAL_BLOCK_NUMBER, LLTV, LiquidatorConfig,
    MarketMakerConfig,
};
use crate::error::{ConfigError, SimError};
use crate::ledger::LiquidityRange;
use crate::types::TokenOrdering;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SEED: u64 = 101;
pub const DEFAULT_N_STEPS: u64 = 100;
pub const DEFAULT_N_BORROW_AGENTS: usize = 10;
pub const MAX_BORROW_AGENTS: usize = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    pub lltv: f64,
    pub borrow_rate_per_block: f64,
    /// Debt asset the lender deposits before the run.
    pub lender_supply: f64,
    pub block_number: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            lltv: LLTV,
            borrow_rate_per_block: BORROW_RATE_PER_BLOCK,
            lender_supply: 1e7,
            block_number: INITIAL_BLOCK_NUMBER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub fee: f64,
    /// Collateral price in debt units.
    pub initial_price: f64,
    pub ordering: TokenOrdering,
    /// Ranges in pool orientation (token0 in token1).
    pub ranges: Vec<LiquidityRange>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fee: 0.003,
            initial_price: 2000.0,
            ordering: TokenOrdering::CollateralIsToken0,
            ranges: vec![
                LiquidityRange {
                    price_lower: 500.0,
                    price_upper: 8000.0,
                    liquidity: 150_000.0,
                },
                LiquidityRange {
                    price_lower: 1500.0,
                    price_upper: 2700.0,
                    liquidity: 300_000.0,
                },
                LiquidityRange {
                    price_lower: 1900.0,
                    price_upper: 2100.0,
                    liquidity: 200_000.0,
                },
            ],
        }
    }
}

impl PoolConfig {
    /// Initial pool price of token0 in token1.
    pub fn initial_pool_price(&self) -> f64 {
        match self.ordering {
            TokenOrdering::CollateralIsToken0 => self.initial_price,
            TokenOrdering::DebtIsToken0 => 1.0 / self.initial_price,
        }
    }

    /// The same liquidity seen from a pool whose token0 is the debt asset,
    /// as in a WETH/DAI pool. Liquidity is unchanged; price bounds invert.
    pub fn with_debt_as_token0(self) -> Self {
        let ranges = match self.ordering {
            TokenOrdering::DebtIsToken0 => self.ranges,
            TokenOrdering::CollateralIsToken0 => self
                .ranges
                .iter()
                .map(|range| LiquidityRange {
                    price_lower: 1.0 / range.price_upper,
                    price_upper: 1.0 / range.price_lower,
                    liquidity: range.liquidity,
                })
                .collect(),
        };
        Self {
            ordering: TokenOrdering::DebtIsToken0,
            ranges,
            ..self
        }
    }
}

/// Everything needed to build and run one simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub n_steps: u64,
    pub n_borrow_agents: usize,
    pub market_maker: MarketMakerConfig,
    pub borrower: BorrowerConfig,
    pub liquidator: LiquidatorConfig,
    pub market: MarketConfig,
    pub pool: PoolConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            n_steps: DEFAULT_N_STEPS,
            n_borrow_agents: DEFAULT_N_BORROW_AGENTS,
            market_maker: MarketMakerConfig::default(),
            borrower: BorrowerConfig::default(),
            liquidator: LiquidatorConfig::default(),
            market: MarketConfig::default(),
            pool: PoolConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects anything a run could not start with. Pool and market
    /// parameters are checked again by their constructors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_borrow_agents == 0 || self.n_borrow_agents > MAX_BORROW_AGENTS {
            return Err(ConfigError::BorrowAgents(self.n_borrow_agents));
        }
        let mm = &self.market_maker;
        if !(mm.dt.is_finite() && mm.dt > 0.0) {
            return Err(ConfigError::TimeStep(mm.dt));
        }
        if !(mm.volatility.is_finite() && mm.volatility >= 0.0) {
            return Err(ConfigError::Volatility(mm.volatility));
        }
        if !(mm.impact_decay.is_finite() && mm.impact_decay > 0.0) {
            return Err(ConfigError::ImpactDecay(mm.impact_decay));
        }
        self.borrower.validate()?;
        self.liquidator.validate()?;
        if !(self.market.lltv > 0.0 && self.market.lltv < 1.0) {
            return Err(ConfigError::Lltv(self.market.lltv));
        }
        if !(self.pool.initial_price.is_finite() && self.pool.initial_price > 0.0) {
            return Err(ConfigError::InitialPrice(self.pool.initial_price));
        }
        Ok(())
    }
}
