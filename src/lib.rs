//! medcost: Medical insurance cost analysis library
//!
//! Loads the insurance dataset, cleans and enriches it with encoded, scaled
//! and binned features, aggregates charges over categorical keys, runs
//! significance tests and serves filtered aggregates to a terminal dashboard.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod stages;
pub mod utils;
