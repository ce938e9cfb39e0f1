//! The fixed two-question script run by the binary.

use snafu::{ResultExt, Snafu};
use std::{io::Write, process::ExitCode};
use tracing::info;

use crate::{
    client::{Error as ClientError, Gemini},
    config::{self, Config},
    runner::QueryRunner,
};

/// Questions asked, in order.
pub const QUESTIONS: [&str; 2] = [
    "What is the best movie of 2022?",
    "Write a short haiku about AI",
];

/// Exit status for a finished [`run`]: 0 once the script ran, whatever the
/// individual questions did; 1 if it never started.
pub fn exit_status<W>(result: &Result<W, StartupError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

/// Process exit code for a finished [`run`].
pub fn exit_code<W>(result: &Result<W, StartupError>) -> ExitCode {
    ExitCode::from(exit_status(result))
}

/// Failures that stop the script before any question is asked.
#[derive(Debug, Snafu)]
pub enum StartupError {
    #[snafu(display("configuration error"))]
    Configure { source: config::Error },

    #[snafu(display("failed to create Gemini client"))]
    Connect { source: ClientError },
}

/// Loads configuration through `lookup`, builds the client with `connect`
/// and asks every entry of [`QUESTIONS`], writing to `out`.
///
/// Configuration problems abort before `connect` is called. Once the client
/// exists the script always completes; individual question failures are
/// printed, not returned.
pub async fn run<L, C, W>(lookup: L, connect: C, out: W) -> Result<W, StartupError>
where
    L: Fn(&str) -> Option<String>,
    C: FnOnce(&Config) -> Result<Gemini, ClientError>,
    W: Write,
{
    let config = Config::from_lookup(lookup).context(ConfigureSnafu)?;
    let client = connect(&config).context(ConnectSnafu)?;
    info!(model = %config.model, "client ready");

    let mut runner = QueryRunner::new(client, out);
    for (index, question) in QUESTIONS.into_iter().enumerate() {
        if index > 0 {
            runner.separator();
        }
        runner.ask(question).await;
    }

    Ok(runner.into_inner())
}
