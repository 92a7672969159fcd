// src/types/mod.rs

pub mod asset;
pub mod market;
pub mod transaction;

pub use asset::{AccountId, Asset, TokenOrdering};
pub use market::{PoolState, Position};
pub use transaction::{
    LedgerEvent, Quote, SwapDirection, SwapKind, SwapQuery, SwapRequest, Transaction,
};
