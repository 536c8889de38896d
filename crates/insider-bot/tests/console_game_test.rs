//! A whole game typed into the console.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use insider_bot::console::{ConsoleGateway, parse_line};
use insider_core::clock::Clock;
use insider_core::rng::DeterministicRng;
use insider_game::application::bot::InsiderBot;
use insider_game::application::config::GameConfig;
use insider_game::application::engine::InsiderEngine;
use insider_game::domain::aggregates::GameOutcome;
use insider_game::domain::word_pool::WordPool;
use insider_test_support::{SequenceRng, TokioClock};
use tokio::sync::mpsc;

fn build_bot(gateway: &ConsoleGateway) -> InsiderBot {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(TokioClock::starting_at(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ));
    // Master P3, Insider P1, first word.
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> =
        Arc::new(Mutex::new(SequenceRng::new(vec![2, 0, 0])));
    let engine = InsiderEngine::new(
        GameConfig::default(),
        WordPool::new(["lighthouse"]),
        clock,
        rng,
        Arc::new(gateway.clone()),
    );
    InsiderBot::new(engine, "spongebot")
}

fn type_line(gateway: &ConsoleGateway, line: &str) -> Option<insider_core::gateway::InboundMessage> {
    gateway.route(parse_line(line).expect("well-formed console line"))
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

fn drain(output: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(line) = output.try_recv() {
        lines.push(line);
    }
    lines
}

#[tokio::test(start_paused = true)]
async fn test_console_game_from_request_to_result() {
    let (gateway, mut output) = ConsoleGateway::new("general");
    let bot = build_bot(&gateway);

    let request = type_line(&gateway, "P2: play insider @P1 @P2 @P3 @P4 @P5")
        .expect("an unanswered channel line is a mention");
    let game = bot.handle_mention(&request).await.unwrap().unwrap();
    settle().await;

    assert!(type_line(&gateway, "dm P3: stop").is_none());
    settle().await;
    for voter in ["P1", "P2", "P3", "P4", "P5"] {
        assert!(type_line(&gateway, &format!("dm {voter}: <@P1>")).is_none());
    }
    let outcome = game.finished().await.unwrap();

    assert!(matches!(outcome, GameOutcome::Voted(ref tally) if tally.total_votes() == 5));
    let lines = drain(&mut output);
    for expected in [
        "[@P1] Hello! You are the Insider for this game. The word is: lighthouse",
        "[#general] The Master for this game is: <@P3>",
        "[@P3] Hello! You are the Master for this game. The word is: lighthouse",
        "[@P3] Ok!",
        "[@P4] Vote recorded. Thanks!",
        "[#general] The votes have been tabulated! <@P1> has been identified as the Insider",
        "[#general] Thanks for playing.",
    ] {
        assert!(lines.iter().any(|line| line == expected), "missing {expected:?} in {lines:#?}");
    }
    assert!(bot.engine().slot().is_free());
}

#[tokio::test(start_paused = true)]
async fn test_console_chatter_and_second_request() {
    let (gateway, mut output) = ConsoleGateway::new("general");
    let bot = build_bot(&gateway);
    let request = type_line(&gateway, "P2: play insider @P1 @P2 @P3").unwrap();
    let _game = bot.handle_mention(&request).await.unwrap().unwrap();
    settle().await;

    let again = type_line(&gateway, "P1: play insider @P1 @P2 @P3").unwrap();
    let chatter = type_line(&gateway, "P4: hello").unwrap();
    assert!(bot.handle_mention(&again).await.unwrap().is_none());
    assert!(bot.handle_mention(&chatter).await.unwrap().is_none());

    let lines = drain(&mut output);
    assert!(lines.contains(&"[#general] Error: Insider game in progress".to_owned()));
    assert_eq!(lines.last().map(String::as_str), Some("[#general] hElLo"));
}
