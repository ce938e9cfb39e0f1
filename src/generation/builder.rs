use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, Transport},
    generation::{GenerateContentRequest, GenerationResponse},
    models::Content,
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    transport: Arc<dyn Transport>,
    contents: Vec<Content>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            contents: Vec::new(),
        }
    }

    /// Adds a user message to the request.
    pub fn with_user_message(mut self, text: impl Into<String>) -> Self {
        self.contents.push(Content::user(text));
        self
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
        }
    }

    /// Executes the content generation request.
    #[instrument(skip_all, fields(messages.parts.count = self.contents.len()))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let transport = self.transport.clone();
        let request = self.build();
        transport.generate_content(request).await
    }
}
