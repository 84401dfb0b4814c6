mod endpoint;
mod modes;

use std::io;
use std::sync::Arc;

use clap::Parser;
use quizbench::secret_store::SecretStore;
use quizbench::{ChatCompletionsClient, Dispatcher, FailurePolicy, ModelClient, RetryPolicy};
use tokio_util::sync::CancellationToken;

use crate::args::CliArgs;
use crate::config::load_config;
use crate::logging::init_logging;
use crate::menu::{self, Mode};

pub async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let loaded = load_config(args.config.clone())?;
    let _logger = init_logging(&loaded.config.logging, &loaded.paths)?;
    if !loaded.config_exists {
        log::debug!(
            "No config at {}, using defaults",
            loaded.paths.config_file.display()
        );
    }

    let mut stdout = io::stdout();
    menu::print_banner(&mut stdout)?;
    let mode = match args.mode() {
        Some(mode) => mode,
        None => menu::prompt_mode(&mut io::stdin().lock(), &mut stdout)?,
    };

    let config = &loaded.config;
    let store = open_secret_store();
    let endpoint = endpoint::resolve_endpoint(&config.endpoint, store.as_ref(), |name| {
        std::env::var(name).ok()
    })?;
    let policy = RetryPolicy::new(config.retry.to_retry_config());
    let client: Arc<dyn ModelClient> = Arc::new(ChatCompletionsClient::new(endpoint, policy)?);
    let label = client.label();

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let failure_policy = if args.continue_on_error || config.batch.continue_on_error {
        FailurePolicy::Continue
    } else {
        FailurePolicy::Abort
    };
    let limit = args.limit.unwrap_or(config.batch.limit);

    match mode {
        Mode::CreateQuestions => {
            modes::create_questions(client, &config.batch, move |client| {
                Dispatcher::sequential(client).cancel_token(cancel)
            })
            .await
        }
        Mode::AnswerQuestions => {
            let dispatcher = Dispatcher::sequential(client)
                .failure_policy(failure_policy)
                .cancel_token(cancel);
            modes::answer_questions(dispatcher, &config.batch, limit, &label)
                .await
                .map(drop)
        }
        Mode::AnswerQuestionsAtScale => {
            let mut dispatcher = Dispatcher::new(client)
                .failure_policy(failure_policy)
                .cancel_token(cancel);
            if let Some(cap) = args.concurrency.or(config.batch.concurrency) {
                dispatcher = dispatcher.concurrency(cap);
            }
            modes::answer_questions(dispatcher, &config.batch, limit, &label)
                .await
                .map(drop)
        }
    }
}

fn open_secret_store() -> Option<SecretStore> {
    match SecretStore::new() {
        Ok(store) => Some(store),
        Err(err) => {
            log::warn!("Secrets store unavailable: {err}");
            None
        }
    }
}

fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, cancelling outstanding requests");
            token.cancel();
        }
    });
}
