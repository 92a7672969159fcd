// src/ledger/pool.rs

//! Concentrated-liquidity pool with piecewise-constant liquidity.
//!
//! Inside a segment of constant liquidity `L` the usual identities hold:
//! `Δtoken1 = L·Δ√P` and `Δtoken0 = L·Δ(1/√P)`. Swaps walk segment by
//! segment until the requested amount is consumed; running past the last
//! boundary is a [`LedgerError::PriceOutOfRange`].

use crate::error::{ConfigError, LedgerError};
use crate::types::{Asset, PoolState, SwapKind, TokenOrdering};
use serde::{Deserialize, Serialize};

/// A liquidity position expressed in plain prices (token0 in token1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRange {
    pub price_lower: f64,
    pub price_upper: f64,
    pub liquidity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapOutcome {
    pub amount_in: f64,
    pub amount_out: f64,
    pub sqrt_price_after: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcentratedPool {
    ordering: TokenOrdering,
    fee: f64,
    sqrt_price: f64,
    /// Ascending sqrt-price boundaries.
    boundaries: Vec<f64>,
    /// `liquidity[i]` is active on `[boundaries[i], boundaries[i + 1])`.
    liquidity: Vec<f64>,
}

impl ConcentratedPool {
    pub fn new(
        ordering: TokenOrdering,
        fee: f64,
        initial_price: f64,
        ranges: &[LiquidityRange],
    ) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&fee) {
            return Err(ConfigError::PoolFee(fee));
        }
        if !(initial_price.is_finite() && initial_price > 0.0) {
            return Err(ConfigError::InitialPrice(initial_price));
        }
        if ranges.is_empty() {
            return Err(ConfigError::PoolRanges("no liquidity ranges".into()));
        }

        let mut boundaries = Vec::with_capacity(ranges.len() * 2);
        for range in ranges {
            let valid = range.price_lower > 0.0
                && range.price_upper.is_finite()
                && range.price_lower < range.price_upper
                && range.liquidity.is_finite()
                && range.liquidity >= 0.0;
            if !valid {
                return Err(ConfigError::PoolRanges(format!("{range:?}")));
            }
            boundaries.push(range.price_lower.sqrt());
            boundaries.push(range.price_upper.sqrt());
        }
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup();

        // Overlapping ranges add up, exactly like stacked LP positions.
        let liquidity = boundaries
            .windows(2)
            .map(|w| {
                let mid = 0.5 * (w[0] + w[1]);
                ranges
                    .iter()
                    .filter(|r| r.price_lower.sqrt() <= mid && mid < r.price_upper.sqrt())
                    .map(|r| r.liquidity)
                    .sum()
            })
            .collect();

        let sqrt_price = initial_price.sqrt();
        let (lowest, highest) = (boundaries[0], boundaries[boundaries.len() - 1]);
        if sqrt_price < lowest || sqrt_price >= highest {
            return Err(ConfigError::PoolRanges(format!(
                "initial price {initial_price} lies outside [{}, {})",
                lowest * lowest,
                highest * highest
            )));
        }

        Ok(Self {
            ordering,
            fee,
            sqrt_price,
            boundaries,
            liquidity,
        })
    }

    pub fn ordering(&self) -> TokenOrdering {
        self.ordering
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    pub fn sqrt_price(&self) -> f64 {
        self.sqrt_price
    }

    /// Collateral price in debt units at the current pool price.
    pub fn collateral_price(&self) -> f64 {
        self.ordering
            .collateral_price(self.sqrt_price * self.sqrt_price)
    }

    pub fn active_liquidity(&self) -> f64 {
        self.segment_index(self.sqrt_price, false)
            .or_else(|| self.segment_index(self.sqrt_price, true))
            .map_or(0.0, |i| self.liquidity[i])
    }

    pub fn state(&self) -> PoolState {
        PoolState {
            sqrt_price: self.sqrt_price,
            liquidity: self.active_liquidity(),
            ordering: self.ordering,
        }
    }

    /// Segment traversed when moving away from `sqrt_price`, downwards when
    /// `zero_for_one` (token0 in pushes the price of token0 down).
    fn segment_index(&self, sqrt_price: f64, zero_for_one: bool) -> Option<usize> {
        let upper = if zero_for_one {
            self.boundaries.partition_point(|&b| b < sqrt_price)
        } else {
            self.boundaries.partition_point(|&b| b <= sqrt_price)
        };
        if upper == 0 || upper >= self.boundaries.len() {
            return None;
        }
        Some(upper - 1)
    }

    /// Computes the swap without touching the pool. Amounts are gross of fee
    /// on the input side.
    pub fn simulate_swap(
        &self,
        asset_in: Asset,
        kind: SwapKind,
        amount: f64,
    ) -> Result<SwapOutcome, LedgerError> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if amount == 0.0 {
            return Ok(SwapOutcome {
                amount_in: 0.0,
                amount_out: 0.0,
                sqrt_price_after: self.sqrt_price,
            });
        }

        let zero_for_one = asset_in == self.ordering.token0();
        let mut price = self.sqrt_price;
        let mut remaining = match kind {
            SwapKind::ExactInput => amount * (1.0 - self.fee),
            SwapKind::ExactOutput => amount,
        };
        let (mut net_in, mut out) = (0.0, 0.0);

        loop {
            let i = self
                .segment_index(price, zero_for_one)
                .ok_or(LedgerError::PriceOutOfRange)?;
            let l = self.liquidity[i];
            let edge = if zero_for_one {
                self.boundaries[i]
            } else {
                self.boundaries[i + 1]
            };
            let (seg_in, seg_out) = segment_amounts(l, price, edge, zero_for_one);
            let capacity = match kind {
                SwapKind::ExactInput => seg_in,
                SwapKind::ExactOutput => seg_out,
            };

            if l > 0.0 && remaining <= capacity {
                let next = price_after(l, price, remaining, zero_for_one, kind);
                let next = if zero_for_one { next.max(edge) } else { next.min(edge) };
                let (step_in, step_out) = segment_amounts(l, price, next, zero_for_one);
                net_in += step_in;
                out += step_out;
                price = next;
                break;
            }

            net_in += seg_in;
            out += seg_out;
            remaining -= capacity;
            price = edge;
        }

        let (amount_in, amount_out) = match kind {
            SwapKind::ExactInput => (amount, out),
            SwapKind::ExactOutput => (net_in / (1.0 - self.fee), amount),
        };
        Ok(SwapOutcome {
            amount_in,
            amount_out,
            sqrt_price_after: price,
        })
    }

    pub fn execute_swap(
        &mut self,
        asset_in: Asset,
        kind: SwapKind,
        amount: f64,
    ) -> Result<SwapOutcome, LedgerError> {
        let outcome = self.simulate_swap(asset_in, kind, amount)?;
        self.sqrt_price = outcome.sqrt_price_after;
        Ok(outcome)
    }
}

/// Token amounts (in, out) for moving from `from` to `to` inside one segment.
fn segment_amounts(l: f64, from: f64, to: f64, zero_for_one: bool) -> (f64, f64) {
    if zero_for_one {
        (l * (1.0 / to - 1.0 / from), l * (from - to))
    } else {
        (l * (to - from), l * (1.0 / from - 1.0 / to))
    }
}

fn price_after(l: f64, sqrt_price: f64, amount: f64, zero_for_one: bool, kind: SwapKind) -> f64 {
    match (zero_for_one, kind) {
        (true, SwapKind::ExactInput) => l * sqrt_price / (l + amount * sqrt_price),
        (true, SwapKind::ExactOutput) => sqrt_price - amount / l,
        (false, SwapKind::ExactInput) => sqrt_price + amount / l,
        (false, SwapKind::ExactOutput) => l * sqrt_price / (l - amount * sqrt_price),
    }
}
