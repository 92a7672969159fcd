// src/simulators/price_matching.rs

//! Sizing the AMM trade that moves the pool price onto a target.
//!
//! Within one liquidity segment `Δtoken1 = L·Δ√P`, which gives a first
//! estimate. Across segments the relation bends, so in exact mode the
//! estimate is refined by a secant iteration against the pool's quoter.

use crate::ledger::SwapPool;
use crate::types::{AccountId, PoolState, SwapKind, SwapQuery, SwapRequest};

/// Trades smaller than this are not worth submitting.
pub const MIN_TRADE_AMOUNT: f64 = 1e-9;
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

const SECANT_TOLERANCE: f64 = 1.48e-8;
const SECANT_STEP: f64 = 1e-4;

#[derive(Debug, Clone, Copy)]
pub struct PriceMatchingSolver {
    exact: bool,
    max_iterations: usize,
}

impl Default for PriceMatchingSolver {
    fn default() -> Self {
        Self {
            exact: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl PriceMatchingSolver {
    pub fn new(exact: bool, max_iterations: usize) -> Self {
        Self {
            exact,
            max_iterations,
        }
    }

    /// `L·|Δ√P|`, the token1 amount for a move inside one liquidity segment.
    pub fn linear_estimate(liquidity: f64, sqrt_price: f64, target_sqrt_price: f64) -> f64 {
        liquidity * (target_sqrt_price - sqrt_price).abs()
    }

    /// Returns the swap that brings the pool to `target_sqrt_price`, or
    /// `None` when no trade is needed or possible.
    pub fn solve<Q: SwapPool + ?Sized>(
        &self,
        sender: AccountId,
        pool: &PoolState,
        target_sqrt_price: f64,
        quoter: &Q,
    ) -> Option<SwapRequest> {
        if !(target_sqrt_price.is_finite() && target_sqrt_price > 0.0) || pool.liquidity <= 0.0 {
            return None;
        }
        let estimate = Self::linear_estimate(pool.liquidity, pool.sqrt_price, target_sqrt_price);
        if !estimate.is_finite() || estimate < MIN_TRADE_AMOUNT {
            return None;
        }

        let token0 = pool.ordering.token0();
        let token1 = pool.ordering.token1();
        // Raising the price of token0 means paying token1 in; lowering it
        // means taking a fixed amount of token1 out.
        let query = |amount: f64| {
            if target_sqrt_price > pool.sqrt_price {
                SwapQuery {
                    asset_in: token1,
                    asset_out: token0,
                    kind: SwapKind::ExactInput,
                    amount,
                }
            } else {
                SwapQuery {
                    asset_in: token0,
                    asset_out: token1,
                    kind: SwapKind::ExactOutput,
                    amount,
                }
            }
        };

        let amount = if self.exact {
            let residual = |amount: f64| {
                quoter
                    .quote(&query(amount))
                    .map(|quote| quote.sqrt_price_after - target_sqrt_price)
            };
            match secant(residual, estimate, self.max_iterations) {
                Ok(Some(root)) => root,
                Ok(None) => {
                    log::debug!("Price matching did not converge, using linear estimate {estimate}");
                    estimate
                }
                Err(err) => {
                    log::debug!("Quote failed while matching price: {err}");
                    return None;
                }
            }
        } else {
            estimate
        };
        if amount < MIN_TRADE_AMOUNT {
            return None;
        }

        let request = match query(amount).kind {
            SwapKind::ExactInput => SwapRequest::exact_input(sender, token1, amount),
            SwapKind::ExactOutput => SwapRequest::exact_output(sender, token1, amount),
        };
        Some(request)
    }
}

/// Derivative-free Newton iteration from `x0`, at most `max_iterations`
/// steps. `Ok(None)` means no usable root; errors of `f` abort.
fn secant<E>(
    mut f: impl FnMut(f64) -> Result<f64, E>,
    x0: f64,
    max_iterations: usize,
) -> Result<Option<f64>, E> {
    let mut p0 = x0;
    let mut p1 = x0 * (1.0 + SECANT_STEP) + SECANT_STEP;
    let mut q0 = f(p0)?;
    if q0 == 0.0 {
        return Ok(Some(p0));
    }
    let mut q1 = f(p1)?;

    for _ in 0..max_iterations {
        if q1 == q0 {
            return Ok(None);
        }
        let p = p1 - q1 * (p1 - p0) / (q1 - q0);
        if !p.is_finite() || p <= 0.0 {
            return Ok(None);
        }
        if (p - p1).abs() < SECANT_TOLERANCE {
            return Ok(Some(p));
        }
        (p0, q0) = (p1, q1);
        p1 = p;
        q1 = f(p1)?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::ledger::{ConcentratedPool, LiquidityRange};
    use crate::types::{Asset, Quote, SwapDirection, TokenOrdering};
    use approx::assert_relative_eq;

    const MM: AccountId = AccountId(10);

    struct Quoter(ConcentratedPool);

    impl SwapPool for Quoter {
        fn pool_state(&self) -> Result<PoolState, LedgerError> {
            Ok(self.0.state())
        }

        fn quote(&self, query: &SwapQuery) -> Result<Quote, LedgerError> {
            let outcome = self.0.simulate_swap(query.asset_in, query.kind, query.amount)?;
            Ok(Quote {
                amount_in: outcome.amount_in,
                amount_out: outcome.amount_out,
                sqrt_price_after: outcome.sqrt_price_after,
            })
        }
    }

    fn quoter(ranges: &[LiquidityRange]) -> Quoter {
        Quoter(ConcentratedPool::new(TokenOrdering::CollateralIsToken0, 0.0, 10_000.0, ranges).unwrap())
    }

    fn uniform() -> Quoter {
        quoter(&[LiquidityRange {
            price_lower: 100.0,
            price_upper: 1_000_000.0,
            liquidity: 1000.0,
        }])
    }

    #[test]
    fn test_linear_estimate() {
        assert_eq!(PriceMatchingSolver::linear_estimate(1000.0, 100.0, 105.0), 5000.0);
    }

    #[test]
    fn test_no_trade_when_already_at_target() {
        let quoter = uniform();
        let state = quoter.pool_state().unwrap();

        let request = PriceMatchingSolver::default().solve(MM, &state, state.sqrt_price, &quoter);

        assert!(request.is_none());
    }

    #[test]
    fn test_no_trade_without_liquidity() {
        let quoter = uniform();
        let mut state = quoter.pool_state().unwrap();
        state.liquidity = 0.0;

        let request = PriceMatchingSolver::default().solve(MM, &state, 105.0, &quoter);

        assert!(request.is_none());
    }

    #[test]
    fn test_higher_target_buys_collateral_with_linear_size() {
        // Arrange
        let quoter = uniform();
        let state = quoter.pool_state().unwrap();

        // Act
        let request = PriceMatchingSolver::new(false, 0)
            .solve(MM, &state, 105.0, &quoter)
            .unwrap();

        // Assert
        assert_eq!(request.direction(), SwapDirection::BuyCollateral);
        assert_eq!(request.kind, SwapKind::ExactInput);
        assert_eq!(request.asset_in, Asset::Debt);
        assert_relative_eq!(request.amount, 5000.0, max_relative = 1e-12);
    }

    #[test]
    fn test_lower_target_sells_collateral_for_exact_output() {
        let quoter = uniform();
        let state = quoter.pool_state().unwrap();

        let request = PriceMatchingSolver::default()
            .solve(MM, &state, 95.0, &quoter)
            .unwrap();

        assert_eq!(request.direction(), SwapDirection::SellCollateral);
        assert_eq!(request.kind, SwapKind::ExactOutput);
        assert_relative_eq!(request.amount, 5000.0, max_relative = 1e-9);
    }

    #[test]
    fn test_debt_as_token0_buys_collateral_by_lowering_pool_price() {
        // Arrange: token0 is the debt asset, priced at 1e-4 collateral.
        let quoter = Quoter(
            ConcentratedPool::new(
                TokenOrdering::DebtIsToken0,
                0.0,
                1e-4,
                &[LiquidityRange {
                    price_lower: 1e-6,
                    price_upper: 1e-2,
                    liquidity: 1000.0,
                }],
            )
            .unwrap(),
        );
        let state = quoter.pool_state().unwrap();

        // Act: a collateral price rise is a lower sqrt price of the debt asset.
        let request = PriceMatchingSolver::default()
            .solve(MM, &state, 0.0095, &quoter)
            .unwrap();
        let landed = quoter.quote(&request.query()).unwrap().sqrt_price_after;

        // Assert: exact output of token1, which is collateral here.
        assert_eq!(request.direction(), SwapDirection::BuyCollateral);
        assert_eq!(request.kind, SwapKind::ExactOutput);
        assert_eq!(request.asset_out, Asset::Collateral);
        assert_relative_eq!(request.amount, 0.5, max_relative = 1e-9);
        assert_relative_eq!(landed, 0.0095, max_relative = 1e-9);
    }

    #[test]
    fn test_exact_mode_accounts_for_thinner_liquidity() {
        // Arrange: the price needs to cross into a segment with half the liquidity.
        let quoter = quoter(&[
            LiquidityRange {
                price_lower: 100.0,
                price_upper: 10_404.0,
                liquidity: 1000.0,
            },
            LiquidityRange {
                price_lower: 10_404.0,
                price_upper: 1_000_000.0,
                liquidity: 500.0,
            },
        ]);
        let state = quoter.pool_state().unwrap();

        // Act
        let request = PriceMatchingSolver::default()
            .solve(MM, &state, 104.0, &quoter)
            .unwrap();
        let landed = quoter.quote(&request.query()).unwrap().sqrt_price_after;

        // Assert: 2000 to reach sqrt 102, then 1000 on L = 500.
        assert_relative_eq!(request.amount, 3000.0, max_relative = 1e-6);
        assert_relative_eq!(landed, 104.0, max_relative = 1e-9);
    }

    #[test]
    fn test_quote_error_means_no_trade() {
        let quoter = uniform();
        let state = quoter.pool_state().unwrap();

        // Beyond the top of the pool every quote fails.
        let request = PriceMatchingSolver::default().solve(MM, &state, 2000.0, &quoter);

        assert!(request.is_none());
    }

    #[test]
    fn test_secant_falls_back_on_flat_function() {
        let root = secant(|_| Ok::<f64, ()>(1.0), 10.0, 5).unwrap();
        assert_eq!(root, None);
    }
}
