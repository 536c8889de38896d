//! Shared helpers for game flow integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use insider_core::clock::Clock;
use insider_core::gateway::{Address, InboundMessage};
use insider_core::rng::DeterministicRng;
use insider_game::application::actor::GameHandle;
use insider_game::application::bot::InsiderBot;
use insider_game::application::config::GameConfig;
use insider_game::application::engine::InsiderEngine;
use insider_game::domain::word_pool::WordPool;
use insider_test_support::{ScriptedGateway, SequenceRng, TokioClock};

pub const CHANNEL: &str = "general";
pub const BOT: &str = "spongebot";

/// Five players; with [`standard_rng`] P3 is the Master and P1 the Insider.
pub const ROSTER: [&str; 5] = ["P1", "P2", "P3", "P4", "P5"];
pub const MASTER: &str = "P3";
pub const INSIDER: &str = "P1";
pub const PLAYERS: [&str; 3] = ["P2", "P4", "P5"];

/// Master at index 2, Insider at index 0 of the rest, first word.
pub fn standard_rng() -> SequenceRng {
    SequenceRng::new(vec![2, 0, 0])
}

/// A clock that follows paused tokio time. Create it inside the runtime.
fn tokio_clock() -> Arc<dyn Clock + Send + Sync> {
    Arc::new(TokioClock::starting_at(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build a bot over `gateway` with default timings.
pub fn build_bot(gateway: &ScriptedGateway, rng: SequenceRng, words: &[&str]) -> InsiderBot {
    build_bot_with_config(gateway, rng, words, GameConfig::default())
}

/// Build a bot over `gateway` with custom timings.
pub fn build_bot_with_config(
    gateway: &ScriptedGateway,
    rng: SequenceRng,
    words: &[&str],
    config: GameConfig,
) -> InsiderBot {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let engine = InsiderEngine::new(
        config,
        WordPool::new(words.iter().copied()),
        tokio_clock(),
        rng,
        Arc::new(gateway.clone()),
    );
    InsiderBot::new(engine, BOT)
}

/// A channel message from `user` mentioning the bot.
pub fn mention(user: &str, text: &str) -> InboundMessage {
    InboundMessage {
        channel: CHANNEL.to_owned(),
        user: user.to_owned(),
        text: format!("<@{BOT}> {text}"),
    }
}

/// The request that starts a game with everyone in [`ROSTER`].
pub fn play_request() -> InboundMessage {
    mention("P2", "play insider <@P1> <@P2> <@P3> <@P4> <@P5>")
}

/// Start a game and fail the test if the bot did not.
pub async fn start_game(bot: &InsiderBot) -> GameHandle {
    bot.handle_mention(&play_request())
        .await
        .unwrap()
        .expect("a game should have started")
}

/// Let spawned dialog tasks run up to their next prompt without moving time.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

pub fn channel() -> Address {
    Address::Channel(CHANNEL.to_owned())
}

pub fn user(name: &str) -> Address {
    Address::User(name.to_owned())
}

/// Everything said in the game channel, in order.
pub fn channel_messages(gateway: &ScriptedGateway) -> Vec<String> {
    gateway.messages_to(&channel())
}
