pub mod decoder;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod storage;

pub use metrics::init_metrics;
pub use storage::{LocalStorage, S3Storage, Storage};
