use display_error_chain::DisplayErrorChain;
use gemini_ask::{config, demo, Gemini};
use std::{io, process::ExitCode};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    config::load_dotenv();

    let result = demo::run(config::env_lookup, Gemini::from_config, io::stdout()).await;
    if let Err(error) = &result {
        eprintln!("{}", DisplayErrorChain::new(error));
    }
    demo::exit_code(&result)
}
