use std::{error::Error, sync::Arc};

use teloxide::{
    prelude::*,
    update_listeners::webhooks::{self, Options},
    utils::command::BotCommands,
};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
use triviabot::{
    catalog::Catalog,
    commands::Command,
    config::Config,
    database::Connection,
    engine::QuizEngine,
    schema::schema,
};

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    if let Err(err) = run(config).await {
        tracing::error!("Bot stopped: {}", err);
        std::process::exit(1);
    }
}

fn init_tracing(log_level: &str) {
    // teloxide reports through `log`.
    if let Err(err) = tracing_log::LogTracer::init() {
        eprintln!("Failed to forward log records: {err}");
    }

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_line_number(true)
        .with_target(false)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {err}");
    }
}

async fn run(config: Config) -> Result<(), Box<dyn Error + Send + Sync>> {
    let catalog = Catalog::load(&config.categories_dir)?;

    let connection = Connection::connect(&config.database_url).await?;
    connection.run_migrations().await?;

    let engine = Arc::new(QuizEngine::new(catalog, Arc::new(connection)));

    let bot = Bot::new(config.token);
    bot.set_my_commands(Command::bot_commands()).await?;
    tracing::info!("Starting bot...");

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema::<Connection>())
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build();

    match config.webhook {
        Some(webhook) => {
            let listener = webhooks::axum(bot, Options::new(webhook.addr, webhook.url)).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        }
        None => dispatcher.dispatch().await,
    }

    Ok(())
}
