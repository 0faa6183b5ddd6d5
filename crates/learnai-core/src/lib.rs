//! learnai-core — Score store, wizard state machine, and quiz benchmarking.
//!
//! This crate holds the data model and all client-side logic of LearnAI.
//! The remote service is reached through the [`traits::LearnApi`] trait,
//! implemented by `learnai-client`.

pub mod engine;
pub mod error;
pub mod grading;
pub mod model;
pub mod report;
pub mod store;
pub mod traits;
pub mod wizard;
