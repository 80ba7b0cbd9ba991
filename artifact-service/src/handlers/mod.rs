//! HTTP handlers for the artifact service.

pub mod generate;
pub mod health;
pub mod metrics;

pub use generate::{generate_code, generate_image, generate_summary, invoke};
pub use health::{health_check, readiness_check};
pub use metrics::metrics;
