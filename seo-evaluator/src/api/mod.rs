//! HTTP API handlers

pub mod evaluate;
pub mod evaluations;
pub mod health;

pub use evaluate::evaluate;
pub use evaluations::get_evaluation;
pub use health::health_routes;
