pub mod config;
pub mod controller;
pub mod error;
pub mod gatekeeper;
pub mod strategies;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use controller::RebalancingController;
pub use error::{Error, Result};
