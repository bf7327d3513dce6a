//! Trip emissions and AI advice module.
//!
//! Computes authoritative CO2 figures locally and asks a language-model
//! provider for a summary and reduction tips, validating its reply before
//! anything reaches the caller.

mod calculator;
mod client;
mod models;
mod prompt;
mod provider;
mod routes;
mod validator;

pub use client::AdviceClient;
pub use provider::{AdviceProvider, GeminiProvider};
pub use routes::router;
