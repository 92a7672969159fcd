// src/lib.rs

// === 1. Declare all the top-level modules ===
pub mod agents;
pub mod config;
pub mod error;
pub mod ledger;
pub mod report;
pub mod scenario;
pub mod simulation;
pub mod simulators;
pub mod types;

// === 2. Re-export the public-facing components to create a clean API ===

// --- From `agents` ---
pub use agents::agent_trait::{Agent, AgentRecord};
pub use agents::agent_type::{AgentType, MarketMakerMode};
pub use agents::borrow_agent::{BorrowAgent, BorrowerState};
pub use agents::liquidation_agent::{Candidate, LiquidationAgent};
pub use agents::market_maker_agent::MarketMakerAgent;

// --- From the simulation engine ---
pub use config::SimulationConfig;
pub use report::RunReport;
pub use simulation::{AgentRow, Simulation, StepRecord};

// --- From `simulators` ---
pub use simulators::gbm::ExternalMarket;
pub use simulators::price_matching::PriceMatchingSolver;

// --- From `ledger` ---
pub use ledger::{InMemoryLedger, Ledger, LedgerSnapshot, LedgerView};

// --- From `error` ---
pub use error::{ConfigError, LedgerError, SimError};

// --- From `types` ---
pub use types::{AccountId, Asset, SwapRequest, Transaction};
