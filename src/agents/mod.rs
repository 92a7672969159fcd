// src/agents/mod.rs

pub mod agent_trait;
pub mod agent_type;
pub mod borrow_agent;
pub mod config;
pub mod liquidation_agent;
pub mod market_maker_agent;

pub use agent_trait::{Agent, AgentRecord};
pub use agent_type::{AgentType, MarketMakerMode};
