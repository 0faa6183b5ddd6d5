//! learnai-client — HTTP access to the LearnAI service.
//!
//! Implements the `LearnApi` trait over reqwest, loads `learnai.toml`
//! configuration, and provides a mock service for tests.

pub mod config;
pub mod http;
pub mod mock;

pub use config::{create_client, load_config_from, LearnaiConfig};
pub use http::HttpClient;
pub use learnai_core::error::ApiError;
pub use mock::{Endpoint, MockApi};
