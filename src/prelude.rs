//! # Prelude for the gemini-ask Crate
//!
//! Re-exports the types needed to build a client and ask questions:
//!
//! ```rust,ignore
//! use gemini_ask::prelude::*;
//! ```

pub use crate::client::{Error as ClientError, Gemini, Transport};
pub use crate::config::{Config, Credential, Error as ConfigError};
pub use crate::generation::{ContentBuilder, GenerationResponse};
pub use crate::models::{Content, Part, Role};
pub use crate::runner::{Answer, QueryRunner, RequestFailure};
