//! Decision oracles for the Meadow agent simulation.
//!
//! The simulation core defines the [`DecisionOracle`](meadow_core::DecisionOracle)
//! seam; this crate fills it:
//!
//! - [`LlmOracle`] prompts an OpenAI-compatible chat completions endpoint
//!   with tool calling, keeping a bounded memory per agent.
//! - [`MockOracle`] follows simple random rules so the engine runs offline.
//! - [`Brain`] selects one of the two from `LLM_*` environment variables.
//!
//! # Modules
//!
//! - [`config`] -- LLM settings from the environment
//! - [`error`] -- setup errors
//! - [`llm`] -- HTTP client and tool definitions
//! - [`memory`] -- per-agent decision and observation memory
//! - [`oracle`] -- oracle implementations
//! - [`parse`] -- tool call and content parsing
//! - [`prompt`] -- `minijinja` prompt templates

pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod oracle;
pub mod parse;
pub mod prompt;

pub use config::LlmConfig;
pub use error::BrainError;
pub use oracle::{Brain, LlmOracle, MockOracle};
