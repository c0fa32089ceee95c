pub mod event_model;
pub mod loader;
