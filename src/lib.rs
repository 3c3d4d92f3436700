pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod models;
pub mod output;
pub mod policies;
pub mod rules;
pub mod state;
pub mod trip;
