//! Synthetic SaaS merchant-month dataset generator.
//!
//! Merchants are drawn from configured categorical distributions, walked
//! through a monthly revenue and churn simulation, then a configured share
//! of rows is deliberately corrupted for data-cleaning practice.

pub mod calendar;
pub mod config;
pub mod dataset;
pub mod defects;
pub mod error;
pub mod event;
pub mod export;
pub mod merchant;
pub mod pipeline;
pub mod rng;
pub mod simulator;
pub mod store;
pub mod types;
