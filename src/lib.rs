pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod query;
pub mod router;

pub use error::{ApiResponse, GatewayError, GatewayResult};
