//! Asking questions and reporting the outcome.

use display_error_chain::DisplayErrorChain;
use snafu::{ensure, ResultExt, Snafu};
use std::{fmt, io::Write};
use tracing::{debug, instrument, warn};

use crate::{
    client::{Error as ClientError, Gemini},
    generation::FinishReason,
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RequestFailure {
    #[snafu(display("question is empty"))]
    EmptyQuestion,

    #[snafu(display("request to Gemini failed"))]
    Client { source: Box<ClientError> },

    #[snafu(display(
        "Gemini returned no answer text ({})",
        empty_answer_reason(block_reason.as_deref(), finish_reason.as_ref())
    ))]
    EmptyAnswer {
        block_reason: Option<String>,
        finish_reason: Option<FinishReason>,
    },
}

fn empty_answer_reason(
    block_reason: Option<&str>,
    finish_reason: Option<&FinishReason>,
) -> String {
    match (block_reason, finish_reason) {
        (Some(block), _) => format!("block reason: {block}"),
        (None, Some(finish)) => format!("finish reason: {finish}"),
        (None, None) => "no reason given".to_string(),
    }
}

/// Text produced by the model for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer(String);

impl Answer {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sends questions one at a time and prints each outcome to `out`.
///
/// A failed question is reported and forgotten: nothing is retried and the
/// runner stays usable for the next one.
pub struct QueryRunner<W> {
    client: Gemini,
    out: W,
}

impl<W: Write> QueryRunner<W> {
    pub fn new(client: Gemini, out: W) -> Self {
        Self { client, out }
    }

    /// Asks a single question and returns the model's answer.
    #[instrument(skip_all, fields(question.len = question.len()))]
    pub async fn answer(&self, question: &str) -> Result<Answer, RequestFailure> {
        ensure!(!question.trim().is_empty(), EmptyQuestionSnafu);

        let response = self
            .client
            .generate_content()
            .with_user_message(question)
            .execute()
            .await
            .map_err(Box::new)
            .context(ClientSnafu)?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                model.version = response.model_version.as_deref(),
                tokens.prompt = usage.prompt_token_count,
                tokens.total = usage.total_token_count,
                "answer received"
            );
        }

        let text = response.text();
        ensure!(
            !text.is_empty(),
            EmptyAnswerSnafu {
                block_reason: response.block_reason().map(str::to_string),
                finish_reason: response.finish_reason().cloned(),
            }
        );
        Ok(Answer(text))
    }

    /// Asks `question` and prints either the answer or the failure.
    pub async fn ask(&mut self, question: &str) {
        let outcome = self.answer(question).await;
        if let Err(error) = self.report(question, outcome) {
            warn!(%error, "failed to write output");
        }
    }

    /// Prints the rule line placed between questions.
    pub fn separator(&mut self) {
        if let Err(error) = write!(self.out, "\n{}\n\n", "=".repeat(50)) {
            warn!(%error, "failed to write output");
        }
    }

    /// Gives back the output sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn report(
        &mut self,
        question: &str,
        outcome: Result<Answer, RequestFailure>,
    ) -> std::io::Result<()> {
        match outcome {
            Ok(answer) => {
                writeln!(self.out, "\nQuestion: {question}")?;
                writeln!(self.out, "\nGemini's Answer:\n{answer}")
            }
            Err(failure) => {
                warn!(error = %failure, "question failed");
                writeln!(
                    self.out,
                    "Error while calling Gemini AI: {}",
                    DisplayErrorChain::new(&failure)
                )
            }
        }
    }
}
