//! Core domain types and analysis logic. No I/O happens here.

pub mod config;
pub mod config_validation;
pub mod context;
pub mod error;
pub mod extremum;
pub mod indicator;
pub mod level;
pub mod normalizer;
pub mod ohlcv;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod trade_plan;
pub mod universe;
