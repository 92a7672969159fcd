// src/types/transaction.rs

use super::asset::{AccountId, Asset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapKind {
    /// `amount` is what the sender pays in.
    ExactInput,
    /// `amount` is what the sender receives.
    ExactOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    BuyCollateral,
    SellCollateral,
}

/// A trade against the AMM pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub sender: AccountId,
    pub asset_in: Asset,
    pub asset_out: Asset,
    pub kind: SwapKind,
    pub amount: f64,
    /// Maximum input for exact-output swaps, minimum output for exact-input
    /// swaps. `None` means no bound.
    pub limit: Option<f64>,
}

impl SwapRequest {
    pub fn exact_input(sender: AccountId, asset_in: Asset, amount: f64) -> Self {
        Self {
            sender,
            asset_in,
            asset_out: asset_in.other(),
            kind: SwapKind::ExactInput,
            amount,
            limit: None,
        }
    }

    pub fn exact_output(sender: AccountId, asset_out: Asset, amount: f64) -> Self {
        Self {
            sender,
            asset_in: asset_out.other(),
            asset_out,
            kind: SwapKind::ExactOutput,
            amount,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: f64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn direction(&self) -> SwapDirection {
        match self.asset_out {
            Asset::Collateral => SwapDirection::BuyCollateral,
            Asset::Debt => SwapDirection::SellCollateral,
        }
    }

    /// The side-effect-free part of the request, as understood by the quoter.
    pub fn query(&self) -> SwapQuery {
        SwapQuery {
            asset_in: self.asset_in,
            asset_out: self.asset_out,
            kind: self.kind,
            amount: self.amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwapQuery {
    pub asset_in: Asset,
    pub asset_out: Asset,
    pub kind: SwapKind,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub amount_in: f64,
    pub amount_out: f64,
    pub sqrt_price_after: f64,
}

/// Every state change an agent can ask the ledger for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transaction {
    SupplyCollateral {
        sender: AccountId,
        amount: f64,
    },
    Borrow {
        sender: AccountId,
        amount: f64,
    },
    Liquidate {
        sender: AccountId,
        borrower: AccountId,
        seized_assets: f64,
    },
    Swap(SwapRequest),
}

impl Transaction {
    pub fn sender(&self) -> AccountId {
        match self {
            Transaction::SupplyCollateral { sender, .. }
            | Transaction::Borrow { sender, .. }
            | Transaction::Liquidate { sender, .. } => *sender,
            Transaction::Swap(swap) => swap.sender,
        }
    }
}

/// Events emitted by successful transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    SupplyCollateral {
        account: AccountId,
        assets: f64,
    },
    Borrow {
        account: AccountId,
        assets: f64,
        shares: f64,
    },
    Liquidate {
        borrower: AccountId,
        repaid_assets: f64,
        repaid_shares: f64,
        seized_assets: f64,
        bad_debt_assets: f64,
    },
    Swap {
        account: AccountId,
        amount_in: f64,
        amount_out: f64,
        sqrt_price_after: f64,
    },
}
