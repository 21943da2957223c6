pub mod config;
pub mod error;
pub mod practice;
pub mod router;
pub mod state;
pub mod tracing;

pub use config::{ApiConfig, Environment};
pub use state::ApiState;
