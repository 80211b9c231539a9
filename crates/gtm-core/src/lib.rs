pub mod analysis;
pub mod bus;
pub mod config;
pub mod content;
pub mod engagement;
pub mod error;
pub mod event;
pub mod llm;
pub mod mock;
pub mod pipeline;
pub mod ports;
pub mod project;
pub mod repo;
pub mod stage;
pub mod state;
pub mod store;
pub mod strategy;
pub mod types;
pub mod workflow;

pub use error::{GtmError, Result};
