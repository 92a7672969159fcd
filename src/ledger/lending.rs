// src/ledger/lending.rs

//! Isolated lending market with share-based debt accounting.

use crate::error::{ConfigError, LedgerError};
use crate::types::{AccountId, Position};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const VIRTUAL_SHARES: f64 = 1e6;
pub const VIRTUAL_ASSETS: f64 = 1.0;

/// Liquidation cursor used to derive the incentive factor (30%).
pub const LIQUIDATION_CURSOR: f64 = 0.3;
pub const MAX_LIQUIDATION_INCENTIVE_FACTOR: f64 = 1.15;

/// Health factor reported for a position without debt: the largest uint256
/// scaled down by 1e18, which is what the on-chain helper returns.
pub const NO_DEBT_HEALTH_FACTOR: f64 = 1.157_920_892_373_162e59;

/// Collateral below this is treated as fully seized.
const DUST: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidationOutcome {
    pub repaid_assets: f64,
    pub repaid_shares: f64,
    pub seized_assets: f64,
    pub bad_debt_assets: f64,
    pub bad_debt_shares: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    lltv: f64,
    borrow_rate_per_block: f64,
    total_supply_assets: f64,
    total_borrow_assets: f64,
    total_borrow_shares: f64,
    positions: BTreeMap<AccountId, Position>,
}

impl MarketState {
    pub fn new(lltv: f64, borrow_rate_per_block: f64) -> Result<Self, ConfigError> {
        if !(lltv > 0.0 && lltv < 1.0) {
            return Err(ConfigError::Lltv(lltv));
        }
        if !(borrow_rate_per_block.is_finite() && borrow_rate_per_block >= 0.0) {
            return Err(ConfigError::BorrowRate(borrow_rate_per_block));
        }
        Ok(Self {
            lltv,
            borrow_rate_per_block,
            total_supply_assets: 0.0,
            total_borrow_assets: 0.0,
            total_borrow_shares: 0.0,
            positions: BTreeMap::new(),
        })
    }

    pub fn lltv(&self) -> f64 {
        self.lltv
    }

    pub fn total_supply_assets(&self) -> f64 {
        self.total_supply_assets
    }

    pub fn total_borrow_assets(&self) -> f64 {
        self.total_borrow_assets
    }

    pub fn liquidity(&self) -> f64 {
        (self.total_supply_assets - self.total_borrow_assets).max(0.0)
    }

    pub fn position(&self, account: AccountId) -> Position {
        self.positions.get(&account).copied().unwrap_or_default()
    }

    pub fn to_borrow_shares(&self, assets: f64) -> f64 {
        assets * (self.total_borrow_shares + VIRTUAL_SHARES)
            / (self.total_borrow_assets + VIRTUAL_ASSETS)
    }

    pub fn to_borrow_assets(&self, shares: f64) -> f64 {
        shares * (self.total_borrow_assets + VIRTUAL_ASSETS)
            / (self.total_borrow_shares + VIRTUAL_SHARES)
    }

    pub fn borrow_assets(&self, account: AccountId) -> f64 {
        self.to_borrow_assets(self.position(account).borrow_shares)
    }

    pub fn health_factor(&self, account: AccountId, price: f64) -> f64 {
        let position = self.position(account);
        let debt = self.to_borrow_assets(position.borrow_shares);
        if debt <= 0.0 {
            return NO_DEBT_HEALTH_FACTOR;
        }
        position.collateral * price * self.lltv / debt
    }

    fn is_healthy(&self, position: &Position, price: f64) -> bool {
        let debt = self.to_borrow_assets(position.borrow_shares);
        debt <= position.collateral * price * self.lltv
    }

    /// `min(1.15, 1 / (1 - cursor * (1 - lltv)))`
    pub fn liquidation_incentive_factor(&self) -> f64 {
        (1.0 / (1.0 - LIQUIDATION_CURSOR * (1.0 - self.lltv)))
            .min(MAX_LIQUIDATION_INCENTIVE_FACTOR)
    }

    pub fn supply(&mut self, assets: f64) -> Result<(), LedgerError> {
        check_amount(assets)?;
        self.total_supply_assets += assets;
        Ok(())
    }

    pub fn supply_collateral(&mut self, account: AccountId, assets: f64) -> Result<(), LedgerError> {
        check_amount(assets)?;
        self.positions.entry(account).or_default().collateral += assets;
        Ok(())
    }

    /// Returns the minted borrow shares.
    pub fn borrow(&mut self, account: AccountId, assets: f64, price: f64) -> Result<f64, LedgerError> {
        check_amount(assets)?;
        let shares = self.to_borrow_shares(assets);

        let mut position = self.position(account);
        position.borrow_shares += shares;

        let mut next = self.clone();
        next.total_borrow_assets += assets;
        next.total_borrow_shares += shares;
        if next.total_borrow_assets > next.total_supply_assets {
            return Err(LedgerError::InsufficientLiquidity {
                requested: assets,
                available: self.liquidity(),
            });
        }
        if !next.is_healthy(&position, price) {
            return Err(LedgerError::InsufficientCollateral(account));
        }

        next.positions.insert(account, position);
        *self = next;
        Ok(shares)
    }

    pub fn liquidate(
        &mut self,
        borrower: AccountId,
        seized_assets: f64,
        price: f64,
    ) -> Result<LiquidationOutcome, LedgerError> {
        check_amount(seized_assets)?;
        let mut position = self.position(borrower);
        if self.is_healthy(&position, price) {
            return Err(LedgerError::HealthyPosition(borrower));
        }
        if seized_assets > position.collateral {
            return Err(LedgerError::SeizeExceedsCollateral {
                borrower,
                requested: seized_assets,
                available: position.collateral,
            });
        }

        let repaid_assets = seized_assets * price / self.liquidation_incentive_factor();
        let repaid_shares = self.to_borrow_shares(repaid_assets);
        if repaid_shares > position.borrow_shares {
            return Err(LedgerError::RepayExceedsDebt {
                borrower,
                requested: repaid_shares,
                available: position.borrow_shares,
            });
        }

        position.borrow_shares -= repaid_shares;
        position.collateral -= seized_assets;
        self.total_borrow_shares -= repaid_shares;
        self.total_borrow_assets = (self.total_borrow_assets - repaid_assets).max(0.0);

        // Whatever debt is left once the collateral is gone is socialized on lenders.
        let (mut bad_debt_assets, mut bad_debt_shares) = (0.0, 0.0);
        if position.collateral <= DUST {
            bad_debt_shares = position.borrow_shares;
            bad_debt_assets = self
                .to_borrow_assets(bad_debt_shares)
                .min(self.total_borrow_assets);
            self.total_borrow_assets -= bad_debt_assets;
            self.total_supply_assets = (self.total_supply_assets - bad_debt_assets).max(0.0);
            self.total_borrow_shares -= bad_debt_shares;
            position.borrow_shares = 0.0;
            position.collateral = 0.0;
        }
        self.positions.insert(borrower, position);

        Ok(LiquidationOutcome {
            repaid_assets,
            repaid_shares,
            seized_assets,
            bad_debt_assets,
            bad_debt_shares,
        })
    }

    /// Compounds the borrow rate over `blocks`; lenders earn the interest.
    pub fn accrue_interest(&mut self, blocks: u64) {
        if self.total_borrow_assets <= 0.0 || self.borrow_rate_per_block == 0.0 {
            return;
        }
        let growth = (1.0 + self.borrow_rate_per_block).powf(blocks as f64);
        let interest = self.total_borrow_assets * (growth - 1.0);
        self.total_borrow_assets += interest;
        self.total_supply_assets += interest;
    }
}

fn check_amount(amount: f64) -> Result<(), LedgerError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const BORROWER: AccountId = AccountId(100);

    fn funded_market() -> MarketState {
        let mut market = MarketState::new(0.9, 0.0).unwrap();
        market.supply(1_000_000.0).unwrap();
        market
    }

    #[test]
    fn test_health_factor_matches_definition() {
        // Arrange: 10 collateral at 2000, 12_000 debt, LLTV 0.9.
        let mut market = funded_market();
        market.supply_collateral(BORROWER, 10.0).unwrap();
        market.borrow(BORROWER, 12_000.0, 2000.0).unwrap();

        // Act
        let hf = market.health_factor(BORROWER, 2000.0);

        // Assert
        assert_relative_eq!(hf, 10.0 * 2000.0 * 0.9 / 12_000.0, max_relative = 1e-9);
        assert_relative_eq!(market.borrow_assets(BORROWER), 12_000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_no_debt_reports_sentinel() {
        let mut market = funded_market();
        market.supply_collateral(BORROWER, 10.0).unwrap();

        assert_eq!(market.health_factor(BORROWER, 2000.0), NO_DEBT_HEALTH_FACTOR);
        assert_eq!(market.health_factor(AccountId(999), 2000.0), NO_DEBT_HEALTH_FACTOR);
    }

    #[test]
    fn test_borrow_beyond_lltv_is_rejected() {
        let mut market = funded_market();
        market.supply_collateral(BORROWER, 10.0).unwrap();

        let result = market.borrow(BORROWER, 18_001.0, 2000.0);

        assert_eq!(result, Err(LedgerError::InsufficientCollateral(BORROWER)));
        assert_eq!(market.position(BORROWER).borrow_shares, 0.0);
        assert_eq!(market.total_borrow_assets(), 0.0);
    }

    #[test]
    fn test_borrow_beyond_liquidity_is_rejected() {
        let mut market = MarketState::new(0.9, 0.0).unwrap();
        market.supply(100.0).unwrap();
        market.supply_collateral(BORROWER, 10.0).unwrap();

        let result = market.borrow(BORROWER, 200.0, 2000.0);

        assert!(matches!(result, Err(LedgerError::InsufficientLiquidity { .. })));
    }

    #[test]
    fn test_liquidating_healthy_position_reverts() {
        let mut market = funded_market();
        market.supply_collateral(BORROWER, 10.0).unwrap();
        market.borrow(BORROWER, 12_000.0, 2000.0).unwrap();

        let result = market.liquidate(BORROWER, 5.0, 2000.0);

        assert_eq!(result, Err(LedgerError::HealthyPosition(BORROWER)));
    }

    #[test]
    fn test_liquidation_repays_with_incentive() {
        // Arrange: price drops from 2000 to 1300, HF = 10*1300*0.9/12000 = 0.975.
        let mut market = funded_market();
        market.supply_collateral(BORROWER, 10.0).unwrap();
        market.borrow(BORROWER, 12_000.0, 2000.0).unwrap();
        let lif = market.liquidation_incentive_factor();

        // Act
        let outcome = market.liquidate(BORROWER, 5.0, 1300.0).unwrap();

        // Assert
        assert_relative_eq!(lif, 1.0 / 0.97, max_relative = 1e-12);
        assert_relative_eq!(outcome.repaid_assets, 5.0 * 1300.0 / lif, max_relative = 1e-12);
        assert_eq!(outcome.bad_debt_assets, 0.0);
        assert_eq!(market.position(BORROWER).collateral, 5.0);
        assert_relative_eq!(
            market.borrow_assets(BORROWER),
            12_000.0 - outcome.repaid_assets,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_seizing_everything_realizes_bad_debt() {
        // Arrange: deeply underwater, seizing all collateral cannot cover the debt.
        let mut market = funded_market();
        market.supply_collateral(BORROWER, 10.0).unwrap();
        market.borrow(BORROWER, 15_000.0, 2000.0).unwrap();
        let supplied = market.total_supply_assets();

        // Act
        let outcome = market.liquidate(BORROWER, 10.0, 1000.0).unwrap();

        // Assert
        assert!(outcome.bad_debt_assets > 0.0);
        assert_eq!(market.position(BORROWER), Position::default());
        assert_relative_eq!(
            market.total_supply_assets(),
            supplied - outcome.bad_debt_assets,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_interest_grows_debt_and_supply() {
        let mut market = MarketState::new(0.9, 1e-3).unwrap();
        market.supply(1_000_000.0).unwrap();
        market.supply_collateral(BORROWER, 10.0).unwrap();
        market.borrow(BORROWER, 10_000.0, 2000.0).unwrap();

        market.accrue_interest(10);

        let expected = 10_000.0 * 1.001_f64.powi(10);
        assert_relative_eq!(market.total_borrow_assets(), expected, max_relative = 1e-12);
        assert!(market.borrow_assets(BORROWER) > 10_000.0);
        assert_relative_eq!(
            market.total_supply_assets(),
            1_000_000.0 + expected - 10_000.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_rejects_invalid_lltv() {
        assert_eq!(MarketState::new(1.0, 0.0).unwrap_err(), ConfigError::Lltv(1.0));
    }
}
