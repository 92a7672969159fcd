// src/report.rs

//! Summary statistics over the rows of one run.

use crate::agents::AgentRecord;
use crate::ledger::NO_DEBT_HEALTH_FACTOR;
use crate::simulation::StepRecord;
use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowerSummary {
    pub account: AccountId,
    /// Lowest health factor seen while holding debt, if it ever borrowed.
    pub min_health_factor: Option<f64>,
    pub final_health_factor: f64,
    pub final_debt: f64,
    pub final_collateral: f64,
    /// Collateral dropped below its peak, which only a liquidation does.
    pub liquidated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub n_steps: usize,
    pub borrowers: Vec<BorrowerSummary>,
    pub liquidated_count: usize,
    /// Borrowers ending the run with a health factor below 1.
    pub underwater_count: usize,
    /// Relative gap `|pool - external| / external`, one sample per step.
    pub divergence_mean: f64,
    pub divergence_std_dev: f64,
    pub divergence_max: f64,
    pub liquidator_debt_balance: Option<f64>,
    pub liquidator_collateral_balance: Option<f64>,
}

#[derive(Default)]
struct BorrowerTrack {
    min_health_factor: Option<f64>,
    peak_collateral: f64,
    last: Option<(f64, f64, f64)>,
}

impl RunReport {
    pub fn from_records(records: &[StepRecord]) -> Self {
        let mut tracks: BTreeMap<AccountId, BorrowerTrack> = BTreeMap::new();
        let mut divergences = Vec::with_capacity(records.len());
        let mut liquidator = None;

        for row in records.iter().flat_map(|step| &step.agents) {
            match row.record {
                AgentRecord::MarketMaker {
                    pool_price,
                    external_price,
                } => {
                    if external_price > 0.0 {
                        divergences.push((pool_price - external_price).abs() / external_price);
                    }
                }
                AgentRecord::Borrower {
                    health_factor,
                    debt_assets,
                    collateral_assets,
                    ..
                } => {
                    let track = tracks.entry(row.account).or_default();
                    if health_factor < NO_DEBT_HEALTH_FACTOR && debt_assets > 0.0 {
                        track.min_health_factor = Some(
                            track
                                .min_health_factor
                                .map_or(health_factor, |min| min.min(health_factor)),
                        );
                    }
                    track.peak_collateral = track.peak_collateral.max(collateral_assets);
                    track.last = Some((health_factor, debt_assets, collateral_assets));
                }
                AgentRecord::Liquidator {
                    debt_balance,
                    collateral_balance,
                } => liquidator = Some((debt_balance, collateral_balance)),
            }
        }

        let borrowers: Vec<BorrowerSummary> = tracks
            .into_iter()
            .filter_map(|(account, track)| {
                let (final_health_factor, final_debt, final_collateral) = track.last?;
                Some(BorrowerSummary {
                    account,
                    min_health_factor: track.min_health_factor,
                    final_health_factor,
                    final_debt,
                    final_collateral,
                    liquidated: final_collateral < track.peak_collateral,
                })
            })
            .collect();

        let (divergence_mean, divergence_std_dev, divergence_max) = match divergences.len() {
            0 => (0.0, 0.0, 0.0),
            1 => (divergences[0], 0.0, divergences[0]),
            _ => (
                divergences.iter().mean(),
                divergences.iter().std_dev(),
                Statistics::max(divergences.iter()),
            ),
        };

        Self {
            n_steps: records.len(),
            liquidated_count: borrowers.iter().filter(|b| b.liquidated).count(),
            underwater_count: borrowers
                .iter()
                .filter(|b| b.final_health_factor < 1.0)
                .count(),
            borrowers,
            divergence_mean,
            divergence_std_dev,
            divergence_max,
            liquidator_debt_balance: liquidator.map(|(debt, _)| debt),
            liquidator_collateral_balance: liquidator.map(|(_, collateral)| collateral),
        }
    }
}
