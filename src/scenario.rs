// src/scenario.rs

//! Initial world state: market creation, lender liquidity and funding of
//! every participant, plus the snapshot cache built on top of it.

use crate::agents::config::MarketMakerConfig;
use crate::agents::{AgentRecord, AgentType};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::ledger::snapshot::snapshot_path;
use crate::ledger::{ConcentratedPool, InMemoryLedger, LedgerSnapshot, LedgerView, MarketState};
use crate::simulation::{Simulation, StepRecord};
use crate::types::{AccountId, Asset};
use std::path::{Path, PathBuf};

pub const SUPPLIER: AccountId = AccountId(1);
pub const MARKET_MAKER: AccountId = AccountId(10);
pub const LIQUIDATOR: AccountId = AccountId(1000);
const BORROWER_BASE: u32 = 100;

const BORROWER_COLLATERAL: f64 = 1e6;
const LIQUIDATOR_FUNDS: f64 = 5e11;
const MARKET_MAKER_COLLATERAL: f64 = 1e6;
const MARKET_MAKER_DEBT: f64 = 1e12;

pub fn borrower_id(index: usize) -> AccountId {
    AccountId(BORROWER_BASE + index as u32)
}

/// Agent order used by the clock: market maker, borrowers, liquidator.
pub fn roster(n_borrow_agents: usize) -> Vec<(AccountId, AgentType)> {
    let mut roster = Vec::with_capacity(n_borrow_agents + 2);
    roster.push((MARKET_MAKER, AgentType::MarketMaker));
    roster.extend((0..n_borrow_agents).map(|i| (borrower_id(i), AgentType::Borrower)));
    roster.push((LIQUIDATOR, AgentType::Liquidator));
    roster
}

/// Creates the market and the pool, deposits the lender's liquidity and
/// mints every participant's starting balances.
pub fn build_ledger(config: &SimulationConfig) -> Result<InMemoryLedger, SimError> {
    let market = MarketState::new(config.market.lltv, config.market.borrow_rate_per_block)?;
    let pool = ConcentratedPool::new(
        config.pool.ordering,
        config.pool.fee,
        config.pool.initial_pool_price(),
        &config.pool.ranges,
    )?;
    let mut ledger = InMemoryLedger::new(config.market.block_number, market, pool);

    ledger.mint(SUPPLIER, Asset::Debt, config.market.lender_supply);
    ledger.supply(SUPPLIER, config.market.lender_supply)?;
    for i in 0..config.n_borrow_agents {
        ledger.mint(borrower_id(i), Asset::Collateral, BORROWER_COLLATERAL);
    }
    ledger.mint(LIQUIDATOR, Asset::Collateral, LIQUIDATOR_FUNDS);
    ledger.mint(LIQUIDATOR, Asset::Debt, LIQUIDATOR_FUNDS);
    ledger.mint(MARKET_MAKER, Asset::Collateral, MARKET_MAKER_COLLATERAL);
    ledger.mint(MARKET_MAKER, Asset::Debt, MARKET_MAKER_DEBT);
    Ok(ledger)
}

pub fn simulation(config: &SimulationConfig) -> Result<Simulation, SimError> {
    let ledger = build_ledger(config)?;
    Simulation::new(ledger, config.clone())
}

/// Builds the initial ledger, sweeps a wide price range with an exploratory
/// market maker on a copy of it, and stores the untouched initial state.
pub fn init_cache(config: &SimulationConfig, dir: &Path) -> Result<PathBuf, SimError> {
    config.validate()?;
    let ledger = build_ledger(config)?;

    let mut exploratory = config.clone();
    exploratory.market_maker = MarketMakerConfig::exploratory(config.n_steps);
    let mut sim = Simulation::new(ledger.clone(), exploratory)?;
    let records = sim.run(config.n_steps)?;
    if let Some((low, high)) = pool_price_range(&records) {
        log::info!("Exploratory run covered pool prices {low:.2} to {high:.2}");
    }

    let path = snapshot_path(dir, ledger.block_number());
    LedgerSnapshot::capture(&ledger).save(&path)?;
    Ok(path)
}

/// Reruns a simulation starting from a stored snapshot.
pub fn run_from_cache(config: &SimulationConfig, snapshot: &Path) -> Result<Vec<StepRecord>, SimError> {
    config.validate()?;
    let snapshot = LedgerSnapshot::load(snapshot)?;
    let mut sim = Simulation::new(snapshot.ledger, config.clone())?;
    sim.run(config.n_steps)
}

fn pool_price_range(records: &[StepRecord]) -> Option<(f64, f64)> {
    records
        .iter()
        .flat_map(|step| &step.agents)
        .filter_map(|row| match row.record {
            AgentRecord::MarketMaker { pool_price, .. } => Some(pool_price),
            _ => None,
        })
        .fold(None, |range, price| match range {
            None => Some((price, price)),
            Some((low, high)) => Some((f64::min(low, price), f64::max(high, price))),
        })
}
