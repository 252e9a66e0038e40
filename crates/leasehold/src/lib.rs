//! Lease lifecycle management and rent computation for commercial property portfolios.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
