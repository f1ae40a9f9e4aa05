//! interview-core — Interview session state machine, scoring, and data model.
//!
//! This crate defines the data model, the collaborator traits, the session
//! store, the scoring client, and the controller that the HTTP server and
//! CLI build on.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod question_bank;
pub mod scoring;
pub mod store;
pub mod traits;

pub use controller::InterviewController;
pub use error::{InterviewError, ProviderError, StoreError};
