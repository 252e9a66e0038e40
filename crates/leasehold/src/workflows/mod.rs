pub mod leasing;
pub mod portfolio;
