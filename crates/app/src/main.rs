use providers::{GeminiClient, RetryPolicy};
use services::{JsonFileStore, KeyValueStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod ambient;
mod commands;
mod console;
mod onboarding;
mod repl;
mod utils;

use onboarding::Prompter;
use repl::Repl;

fn main() -> anyhow::Result<()> {
    let (settings, existed) = utils::load_settings_or_default();

    // Logs go to stderr so the conversation on stdout stays readable
    let filter = utils::log_filter(&settings);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if !existed {
        utils::save_settings(&settings);
    }

    let data_dir = utils::data_dir(&settings);
    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(&data_dir)?);
    tracing::info!("Data directory: {}", data_dir.display());

    let config = {
        let stdin = std::io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), std::io::stdout());
        onboarding::authenticate(&mut prompter, store.as_ref())?
    };

    let client = GeminiClient::from_auth(&settings.model)?;
    let retry = RetryPolicy::from_settings(&settings.retry);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(Repl::new(client, retry, store, &config.user_name).run())
}
