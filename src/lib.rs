//! # gemini-ask
//!
//! Sends fixed questions to Google's Gemini API and prints the answers.
//!
//! The binary loads its API key from the environment (or a `.env` file),
//! builds a [`Gemini`] client and runs the two-question script in [`demo`].
//! Each question goes through a [`QueryRunner`], which prints the answer or a
//! readable error and moves on.

pub mod client;
pub mod config;
pub mod demo;
pub mod generation;
pub mod models;
pub mod prelude;
pub mod runner;


pub use client::{Error as ClientError, Gemini, GeminiClient, Transport};
pub use config::{load_credential, Config, Credential, Error as ConfigError};
pub use generation::{
    Candidate, ContentBuilder, FinishReason, GenerateContentRequest, GenerationResponse,
    UsageMetadata,
};
pub use models::{Content, Part, Role};
pub use runner::{Answer, QueryRunner, RequestFailure};
