pub mod error_classifier;
