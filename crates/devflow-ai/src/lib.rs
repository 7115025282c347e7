//! `devflow-ai`: the generative-model side of devflow.
//!
//! Every AI feature reduces to one capability, [`Generator::generate`]: send a
//! prompt, optionally with a declared output shape, and get text back.
//!
//! # Architecture
//!
//! ```text
//! tools::*            ← one async fn per feature
//!     │                  builds the prompt (prompts.rs), parses the reply
//!     ▼                  (extract.rs, typed serde shapes)
//! dyn Generator       ← trait seam; tests plug in canned replies
//!     │
//!     ▼
//! GeminiClient        ← POST {api_base}/v1beta/models/{model}:generateContent
//! ```
//!
//! Calls are single attempts. Transport failures, API errors and replies that
//! do not match their declared shape come back as distinct
//! [`GenerationError`] variants.

pub mod client;
pub mod error;
pub mod extract;
pub mod prompts;
pub mod schema;
pub mod tools;
pub mod types;

pub use client::{GeminiClient, Generator};
pub use error::GenerationError;
pub use schema::OutputSchema;
pub use types::{GenerationRequest, ModelTier, Tool};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GenerationError>;
