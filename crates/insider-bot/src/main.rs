//! Insider bot entry point: plays Insider over stdin/stdout.

use std::sync::{Arc, Mutex};

use insider_bot::config::BotConfig;
use insider_bot::console::{self, ConsoleGateway, ConsoleLine};
use insider_bot::error::AppError;
use insider_core::clock::{Clock, SystemClock};
use insider_core::gateway::InboundMessage;
use insider_core::rng::{DeterministicRng, SystemRng};
use insider_game::application::bot::InsiderBot;
use insider_game::application::engine::InsiderEngine;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Logs go to stderr so the conversation on stdout stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Insider bot");

    let config = BotConfig::from_env()?;
    let words = config.load_words().await?;

    let (gateway, mut output) = ConsoleGateway::new(config.channel.clone());
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> =
        Arc::new(Mutex::new(SystemRng::from_entropy()));
    let engine = InsiderEngine::new(config.game, words, clock, rng, Arc::new(gateway.clone()));
    let bot = InsiderBot::new(engine, config.bot_name.clone());

    let printer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = output.recv().await {
            let written = async {
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await
            };
            if let Err(e) = written.await {
                error!(error = %e, "could not write to stdout");
                break;
            }
        }
    });

    bot.handle_channel_join(&config.channel).await?;
    info!(
        channel = %config.channel,
        bot_name = %config.bot_name,
        guess_seconds = config.game.guess_duration.as_secs(),
        "ready, type `name: text` or `dm name: text`"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match console::parse_line(&line) {
            None if line.trim().is_empty() => {}
            None => warn!(%line, "unrecognized input, expected `name: text` or `dm name: text`"),
            Some(ConsoleLine::Join(channel)) => {
                if let Err(e) = bot.handle_channel_join(&channel).await {
                    error!(error = %e, %channel, "could not join channel");
                }
            }
            Some(line) => {
                if let Some(message) = gateway.route(line) {
                    tokio::spawn(handle_mention(bot.clone(), message));
                }
            }
        }
    }

    info!("stdin closed, shutting down");
    drop(bot);
    drop(gateway);
    printer.abort();
    Ok(())
}

async fn handle_mention(bot: InsiderBot, message: InboundMessage) {
    match bot.handle_mention(&message).await {
        Ok(Some(game)) => {
            let session_id = game.session_id();
            match game.finished().await {
                Ok(outcome) => info!(%session_id, ?outcome, "game over"),
                Err(e) => error!(error = %e, %session_id, "game ended abnormally"),
            }
        }
        Ok(None) => {}
        Err(e) => error!(error = %e, user = %message.user, "could not handle mention"),
    }
}
