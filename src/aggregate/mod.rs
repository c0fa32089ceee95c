pub mod aggregator;
pub mod case_model;
pub mod steps;
