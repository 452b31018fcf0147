//! examforge-store: question store adapters.
//!
//! Implements the `QuestionStore` trait over the exam backend's REST API and
//! in memory, and loads the configuration that selects between them.

pub mod config;
pub mod http;
pub mod memory;

pub use config::{
    create_store, load_config, load_config_from, ExamforgeConfig, StoreConfig, SAMPLE_CONFIG,
};
pub use http::HttpStore;
pub use memory::MemoryStore;
