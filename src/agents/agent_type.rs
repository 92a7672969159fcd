// src/agents/agent_type.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentType {
    MarketMaker,
    Borrower,
    Liquidator,
}

/// How the market maker drives its external market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketMakerMode {
    #[default]
    Normal,
    /// Inverts the drift after steps `n_steps / 4` and `3 * n_steps / 4`, so a
    /// single run sweeps a wide price range.
    ExploratoryDriftFlip { n_steps: u64 },
}
