// src/ledger/memory.rs

use super::lending::MarketState;
use super::pool::ConcentratedPool;
use super::{LedgerView, LendingMarket, Ledger, PriceOracle, SwapPool, TokenBalances};
use crate::error::LedgerError;
use crate::types::{
    AccountId, Asset, LedgerEvent, PoolState, Position, Quote, SwapKind, SwapQuery, SwapRequest,
    Transaction,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub collateral: f64,
    pub debt: f64,
}

impl Wallet {
    fn get(&self, asset: Asset) -> f64 {
        match asset {
            Asset::Collateral => self.collateral,
            Asset::Debt => self.debt,
        }
    }

    fn get_mut(&mut self, asset: Asset) -> &mut f64 {
        match asset {
            Asset::Collateral => &mut self.collateral,
            Asset::Debt => &mut self.debt,
        }
    }
}

/// Self-contained ledger: token balances, one lending market whose oracle
/// reads the spot price of one AMM pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryLedger {
    block_number: u64,
    balances: BTreeMap<AccountId, Wallet>,
    market: MarketState,
    pool: ConcentratedPool,
}

impl InMemoryLedger {
    pub fn new(block_number: u64, market: MarketState, pool: ConcentratedPool) -> Self {
        Self {
            block_number,
            balances: BTreeMap::new(),
            market,
            pool,
        }
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn pool(&self) -> &ConcentratedPool {
        &self.pool
    }

    pub fn wallet(&self, account: AccountId) -> Wallet {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn mint(&mut self, account: AccountId, asset: Asset, amount: f64) {
        *self.balances.entry(account).or_default().get_mut(asset) += amount;
    }

    /// Lender deposit into the lending market.
    pub fn supply(&mut self, account: AccountId, amount: f64) -> Result<(), LedgerError> {
        self.ensure_balance(account, Asset::Debt, amount)?;
        self.market.supply(amount)?;
        self.move_funds(account, Asset::Debt, -amount);
        Ok(())
    }

    fn ensure_balance(&self, account: AccountId, asset: Asset, needed: f64) -> Result<(), LedgerError> {
        let available = self.wallet(account).get(asset);
        if available < needed {
            return Err(LedgerError::InsufficientBalance {
                account,
                asset,
                needed,
                available,
            });
        }
        Ok(())
    }

    fn move_funds(&mut self, account: AccountId, asset: Asset, delta: f64) {
        *self.balances.entry(account).or_default().get_mut(asset) += delta;
    }

    fn swap(&mut self, request: &SwapRequest) -> Result<LedgerEvent, LedgerError> {
        if request.asset_in == request.asset_out {
            return Err(LedgerError::SameAsset(request.asset_in));
        }
        let outcome = self
            .pool
            .simulate_swap(request.asset_in, request.kind, request.amount)?;

        if let Some(limit) = request.limit {
            let breached = match request.kind {
                SwapKind::ExactInput => outcome.amount_out < limit,
                SwapKind::ExactOutput => outcome.amount_in > limit,
            };
            if breached {
                let required = match request.kind {
                    SwapKind::ExactInput => outcome.amount_out,
                    SwapKind::ExactOutput => outcome.amount_in,
                };
                return Err(LedgerError::SlippageExceeded { required, limit });
            }
        }
        self.ensure_balance(request.sender, request.asset_in, outcome.amount_in)?;

        self.pool
            .execute_swap(request.asset_in, request.kind, request.amount)?;
        self.move_funds(request.sender, request.asset_in, -outcome.amount_in);
        self.move_funds(request.sender, request.asset_out, outcome.amount_out);

        Ok(LedgerEvent::Swap {
            account: request.sender,
            amount_in: outcome.amount_in,
            amount_out: outcome.amount_out,
            sqrt_price_after: outcome.sqrt_price_after,
        })
    }
}

impl TokenBalances for InMemoryLedger {
    fn balance_of(&self, account: AccountId, asset: Asset) -> Result<f64, LedgerError> {
        Ok(self.wallet(account).get(asset))
    }
}

impl PriceOracle for InMemoryLedger {
    fn price(&self) -> Result<f64, LedgerError> {
        Ok(self.pool.collateral_price())
    }
}

impl LendingMarket for InMemoryLedger {
    fn lltv(&self) -> f64 {
        self.market.lltv()
    }

    fn position(&self, account: AccountId) -> Result<Position, LedgerError> {
        Ok(self.market.position(account))
    }

    fn borrow_assets(&self, account: AccountId) -> Result<f64, LedgerError> {
        Ok(self.market.borrow_assets(account))
    }

    fn health_factor(&self, account: AccountId) -> Result<f64, LedgerError> {
        Ok(self.market.health_factor(account, self.price()?))
    }
}

impl SwapPool for InMemoryLedger {
    fn pool_state(&self) -> Result<PoolState, LedgerError> {
        Ok(self.pool.state())
    }

    fn quote(&self, query: &SwapQuery) -> Result<Quote, LedgerError> {
        if query.asset_in == query.asset_out {
            return Err(LedgerError::SameAsset(query.asset_in));
        }
        let outcome = self
            .pool
            .simulate_swap(query.asset_in, query.kind, query.amount)?;
        Ok(Quote {
            amount_in: outcome.amount_in,
            amount_out: outcome.amount_out,
            sqrt_price_after: outcome.sqrt_price_after,
        })
    }
}

impl LedgerView for InMemoryLedger {
    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn simulate(&self, tx: &Transaction) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut scratch = self.clone();
        scratch.submit(tx)
    }
}

impl Ledger for InMemoryLedger {
    fn submit(&mut self, tx: &Transaction) -> Result<Vec<LedgerEvent>, LedgerError> {
        let event = match tx {
            Transaction::SupplyCollateral { sender, amount } => {
                self.ensure_balance(*sender, Asset::Collateral, *amount)?;
                self.market.supply_collateral(*sender, *amount)?;
                self.move_funds(*sender, Asset::Collateral, -amount);
                LedgerEvent::SupplyCollateral {
                    account: *sender,
                    assets: *amount,
                }
            }
            Transaction::Borrow { sender, amount } => {
                let price = self.price()?;
                let shares = self.market.borrow(*sender, *amount, price)?;
                self.move_funds(*sender, Asset::Debt, *amount);
                LedgerEvent::Borrow {
                    account: *sender,
                    assets: *amount,
                    shares,
                }
            }
            Transaction::Liquidate {
                sender,
                borrower,
                seized_assets,
            } => {
                let price = self.price()?;
                let mut market = self.market.clone();
                let outcome = market.liquidate(*borrower, *seized_assets, price)?;
                self.ensure_balance(*sender, Asset::Debt, outcome.repaid_assets)?;
                self.market = market;
                self.move_funds(*sender, Asset::Debt, -outcome.repaid_assets);
                self.move_funds(*sender, Asset::Collateral, outcome.seized_assets);
                LedgerEvent::Liquidate {
                    borrower: *borrower,
                    repaid_assets: outcome.repaid_assets,
                    repaid_shares: outcome.repaid_shares,
                    seized_assets: outcome.seized_assets,
                    bad_debt_assets: outcome.bad_debt_assets,
                }
            }
            Transaction::Swap(request) => self.swap(request)?,
        };
        Ok(vec![event])
    }

    fn advance_block(&mut self) {
        self.block_number += 1;
        self.market.accrue_interest(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::pool::LiquidityRange;
    use crate::types::TokenOrdering;
    use approx::assert_relative_eq;

    const LENDER: AccountId = AccountId(1);
    const BORROWER: AccountId = AccountId(100);
    const LIQUIDATOR: AccountId = AccountId(1000);

    fn ledger() -> InMemoryLedger {
        let market = MarketState::new(0.9, 0.0).unwrap();
        let pool = ConcentratedPool::new(
            TokenOrdering::CollateralIsToken0,
            0.003,
            2000.0,
            &[LiquidityRange {
                price_lower: 500.0,
                price_upper: 8000.0,
                liquidity: 100_000.0,
            }],
        )
        .unwrap();
        let mut ledger = InMemoryLedger::new(1, market, pool);
        ledger.mint(LENDER, Asset::Debt, 1e7);
        ledger.supply(LENDER, 1e7).unwrap();
        ledger.mint(BORROWER, Asset::Collateral, 100.0);
        ledger.mint(LIQUIDATOR, Asset::Debt, 1e9);
        ledger.mint(LIQUIDATOR, Asset::Collateral, 1e6);
        ledger
    }

    #[test]
    fn test_supply_then_borrow_moves_balances() {
        // Arrange
        let mut ledger = ledger();

        // Act
        ledger
            .submit(&Transaction::SupplyCollateral {
                sender: BORROWER,
                amount: 10.0,
            })
            .unwrap();
        ledger
            .submit(&Transaction::Borrow {
                sender: BORROWER,
                amount: 15_000.0,
            })
            .unwrap();

        // Assert
        assert_eq!(ledger.balance_of(BORROWER, Asset::Collateral).unwrap(), 90.0);
        assert_eq!(ledger.balance_of(BORROWER, Asset::Debt).unwrap(), 15_000.0);
        assert_eq!(ledger.position(BORROWER).unwrap().collateral, 10.0);
        let hf = ledger.health_factor(BORROWER).unwrap();
        assert_relative_eq!(hf, 10.0 * 2000.0 * 0.9 / 15_000.0, max_relative = 1e-6);
    }

    #[test]
    fn test_failed_transaction_changes_nothing() {
        let mut ledger = ledger();
        let before = ledger.wallet(BORROWER);

        let result = ledger.submit(&Transaction::SupplyCollateral {
            sender: BORROWER,
            amount: 1_000.0,
        });

        assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })));
        assert_eq!(ledger.wallet(BORROWER), before);
        assert_eq!(ledger.position(BORROWER).unwrap(), Position::default());
    }

    #[test]
    fn test_simulate_leaves_state_untouched() {
        let ledger = ledger();
        let sqrt_before = ledger.pool().sqrt_price();

        let events = ledger
            .simulate(&Transaction::Swap(SwapRequest::exact_input(
                LIQUIDATOR,
                Asset::Debt,
                1_000_000.0,
            )))
            .unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(ledger.pool().sqrt_price(), sqrt_before);
        assert_eq!(ledger.balance_of(LIQUIDATOR, Asset::Debt).unwrap(), 1e9);
    }

    #[test]
    fn test_swap_moves_oracle_price() {
        let mut ledger = ledger();
        let price_before = ledger.price().unwrap();

        ledger
            .submit(&Transaction::Swap(SwapRequest::exact_input(
                LIQUIDATOR,
                Asset::Debt,
                1_000_000.0,
            )))
            .unwrap();

        assert!(ledger.price().unwrap() > price_before);
        assert!(ledger.balance_of(LIQUIDATOR, Asset::Collateral).unwrap() > 1e6);
    }

    #[test]
    fn test_swap_limit_is_enforced() {
        let mut ledger = ledger();

        let request = SwapRequest::exact_output(LIQUIDATOR, Asset::Debt, 10_000.0).with_limit(1.0);
        let result = ledger.submit(&Transaction::Swap(request));

        assert!(matches!(result, Err(LedgerError::SlippageExceeded { .. })));
    }

    #[test]
    fn test_liquidation_after_price_drop() {
        // Arrange: borrow close to the limit, then crash the pool price.
        let mut ledger = ledger();
        ledger
            .submit(&Transaction::SupplyCollateral {
                sender: BORROWER,
                amount: 10.0,
            })
            .unwrap();
        ledger
            .submit(&Transaction::Borrow {
                sender: BORROWER,
                amount: 17_000.0,
            })
            .unwrap();
        ledger
            .submit(&Transaction::Swap(SwapRequest::exact_input(
                LIQUIDATOR,
                Asset::Collateral,
                200.0,
            )))
            .unwrap();
        assert!(ledger.health_factor(BORROWER).unwrap() < 1.0);

        // Act
        let events = ledger
            .submit(&Transaction::Liquidate {
                sender: LIQUIDATOR,
                borrower: BORROWER,
                seized_assets: 5.0,
            })
            .unwrap();

        // Assert
        match &events[0] {
            LedgerEvent::Liquidate {
                seized_assets,
                repaid_assets,
                ..
            } => {
                assert_eq!(*seized_assets, 5.0);
                assert!(*repaid_assets > 0.0);
            }
            other => panic!("Expected a Liquidate event, got {other:?}"),
        }
        assert_eq!(ledger.position(BORROWER).unwrap().collateral, 5.0);
    }

    #[test]
    fn test_advance_block_increments_height() {
        let mut ledger = ledger();
        ledger.advance_block();
        assert_eq!(ledger.block_number(), 2);
    }
}
