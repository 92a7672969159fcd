// src/simulators/mod.rs

pub mod gbm;
pub mod price_matching;
