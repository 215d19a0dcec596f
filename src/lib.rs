pub mod board;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ghost;
pub mod powerup;
pub mod rng;
pub mod rules;
pub mod session;
pub mod shop;
pub mod stats_store;
pub mod types;
