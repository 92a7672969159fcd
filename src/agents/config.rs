// src/agents/config.rs

//! A centralized place for tuning agent behavior parameters.

use super::agent_type::MarketMakerMode;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// --- MarketMakerAgent ---
// Arbitrageur that keeps the pool aligned with a GBM reference market.
pub const MM_DT: f64 = 0.01;
pub const MM_DRIFT: f64 = 0.0;
pub const MM_VOLATILITY: f64 = 0.3;
pub const MM_IMPACT_DECAY: f64 = 2.0;
pub const MM_IMPACT_SCALE: f64 = 0.1;
pub const MM_SOLVER_MAX_ITERATIONS: usize = 5;
// Used when exploring the price range for a cache.
pub const MM_EXPLORATORY_DRIFT: f64 = 0.1;
pub const MM_EXPLORATORY_VOLATILITY: f64 = 0.6;

// --- BorrowAgent ---
pub const BORROW_ACTIVATION_RATE: f64 = 0.8;
pub const BORROW_INITIAL_LTV: f64 = 0.75;
pub const BORROW_COLLATERAL_AMOUNT: f64 = 10.0;
// The realized LTV is initial_ltv scaled by u ~ U[min, max).
pub const BORROW_LTV_JITTER_MIN: f64 = 0.9;
pub const BORROW_LTV_JITTER_MAX: f64 = 1.0;

// --- LiquidationAgent ---
pub const LIQUIDATOR_HF_THRESHOLD: f64 = 0.99;
pub const LIQUIDATOR_SEIZE_FRACTION: f64 = 0.5;

// --- Lending market ---
pub const LLTV: f64 = 0.9;
pub const BORROW_RATE_PER_BLOCK: f64 = 1.5e-9;
pub const INITIAL_BLOCK_NUMBER: u64 = 18_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMakerConfig {
    pub drift: f64,
    pub volatility: f64,
    pub dt: f64,
    pub impact_decay: f64,
    pub impact_scale: f64,
    /// Secant refinement against the quoter; linear estimate only when off.
    pub exact: bool,
    pub max_iterations: usize,
    pub mode: MarketMakerMode,
}

impl Default for MarketMakerConfig {
    fn default() -> Self {
        Self {
            drift: MM_DRIFT,
            volatility: MM_VOLATILITY,
            dt: MM_DT,
            impact_decay: MM_IMPACT_DECAY,
            impact_scale: MM_IMPACT_SCALE,
            exact: true,
            max_iterations: MM_SOLVER_MAX_ITERATIONS,
            mode: MarketMakerMode::Normal,
        }
    }
}

impl MarketMakerConfig {
    /// Drift and volatility used to sweep the pool when building a cache.
    pub fn exploratory(n_steps: u64) -> Self {
        Self {
            drift: MM_EXPLORATORY_DRIFT,
            volatility: MM_EXPLORATORY_VOLATILITY,
            mode: MarketMakerMode::ExploratoryDriftFlip { n_steps },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BorrowerConfig {
    pub activation_rate: f64,
    pub initial_ltv: f64,
    pub collateral_amount: f64,
}

impl Default for BorrowerConfig {
    fn default() -> Self {
        Self {
            activation_rate: BORROW_ACTIVATION_RATE,
            initial_ltv: BORROW_INITIAL_LTV,
            collateral_amount: BORROW_COLLATERAL_AMOUNT,
        }
    }
}

impl BorrowerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.activation_rate > 0.0 && self.activation_rate < 1.0) {
            return Err(ConfigError::ActivationRate(self.activation_rate));
        }
        if !(self.initial_ltv > 0.0 && self.initial_ltv < 1.0) {
            return Err(ConfigError::InitialLtv(self.initial_ltv));
        }
        if !(self.collateral_amount.is_finite() && self.collateral_amount > 0.0) {
            return Err(ConfigError::CollateralAmount(self.collateral_amount));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiquidatorConfig {
    pub hf_threshold: f64,
}

impl Default for LiquidatorConfig {
    fn default() -> Self {
        Self {
            hf_threshold: LIQUIDATOR_HF_THRESHOLD,
        }
    }
}

impl LiquidatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hf_threshold.is_finite() && self.hf_threshold > 0.0) {
            return Err(ConfigError::HealthFactorThreshold(self.hf_threshold));
        }
        Ok(())
    }
}
