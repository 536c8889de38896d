//! Scripted conversations with participants.

use std::sync::Arc;
use std::time::Duration;

use insider_core::error::GatewayError;
use insider_core::gateway::{Conversation, DialogStatus, MessagingGateway};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::replies::{MasterReply, RevealAnswer};
use crate::domain::text;

/// Consecutive failed prompts after which the Master dialog gives up.
pub const MAX_PROMPT_FAILURES: usize = 3;

/// Tells the Insider the secret word in private.
///
/// # Errors
///
/// Returns the `GatewayError` if the Insider cannot be reached.
pub async fn notify_insider(
    gateway: &dyn MessagingGateway,
    insider: &str,
    word: &str,
) -> Result<(), GatewayError> {
    let conversation = gateway.start_private_conversation(insider).await?;
    conversation.say(&text::insider_notice(word)).await
}

/// Tells the Master the secret word on their private conversation.
///
/// # Errors
///
/// Returns the `GatewayError` if the notice cannot be delivered.
pub async fn notify_master(
    conversation: &dyn Conversation,
    word: &str,
) -> Result<(), GatewayError> {
    conversation.say(&text::master_notice(word)).await
}

/// Prompts the Master until they answer STOP (`Completed`) or QUIT
/// (`Stopped`), or until the conversation is stopped from outside
/// (`Stopped`).
///
/// Unrecognized answers repeat the prompt.
///
/// # Errors
///
/// Returns the last `GatewayError` once [`MAX_PROMPT_FAILURES`] prompts in
/// a row could not be delivered. The conversation is stopped first.
pub async fn master_dialog(
    conversation: &dyn Conversation,
) -> Result<DialogStatus, GatewayError> {
    let mut failures = 0;
    loop {
        match conversation.ask(text::MASTER_PROMPT).await {
            Ok(reply) => match MasterReply::parse(&reply) {
                Some(MasterReply::Stop) => {
                    if let Err(error) = conversation.say(text::MASTER_STOP_ACK).await {
                        warn!(%error, "could not acknowledge STOP");
                    }
                    return Ok(DialogStatus::Completed);
                }
                Some(MasterReply::Quit) => {
                    if let Err(error) = conversation.say(text::MASTER_QUIT_ACK).await {
                        warn!(%error, "could not acknowledge QUIT");
                    }
                    conversation.stop().await;
                    return Ok(DialogStatus::Stopped);
                }
                None => {
                    failures = 0;
                    debug!(%reply, "unrecognized Master reply, prompting again");
                }
            },
            Err(GatewayError::ConversationStopped(_)) => return Ok(DialogStatus::Stopped),
            Err(error) => {
                failures += 1;
                warn!(%error, failures, "Master prompt failed");
                if failures >= MAX_PROMPT_FAILURES {
                    conversation.stop().await;
                    return Err(error);
                }
            }
        }
    }
}

/// Asks one participant for their vote. `None` is an abstention: the
/// participant could not be reached or their dialog failed.
pub async fn request_vote(gateway: &dyn MessagingGateway, participant: &str) -> Option<String> {
    let conversation = match gateway.start_private_conversation(participant).await {
        Ok(conversation) => conversation,
        Err(error) => {
            warn!(%error, participant, "vote request not delivered, counting an abstention");
            return None;
        }
    };

    match conversation.ask(text::VOTE_PROMPT).await {
        Ok(vote) => {
            if let Err(error) = conversation.say(text::VOTE_RECORDED).await {
                warn!(%error, participant, "could not confirm vote");
            }
            Some(vote)
        }
        Err(error) => {
            warn!(%error, participant, "vote dialog failed, counting an abstention");
            None
        }
    }
}

/// Asks every participant at once and returns once all of them answered or
/// gave up. Dropping the future abandons the outstanding requests.
pub async fn collect_votes(
    gateway: Arc<dyn MessagingGateway>,
    participants: Vec<String>,
) -> Vec<String> {
    let mut requests = JoinSet::new();
    for participant in participants {
        let gateway = Arc::clone(&gateway);
        requests.spawn(async move { request_vote(gateway.as_ref(), &participant).await });
    }

    let mut votes = Vec::with_capacity(requests.len());
    while let Some(result) = requests.join_next().await {
        match result {
            Ok(Some(vote)) => votes.push(vote),
            Ok(None) => {}
            Err(error) => warn!(%error, "vote request task failed"),
        }
    }
    votes
}

/// Offers the group the Insider's identity after the vote ran out of time.
///
/// If nobody answers within `timeout`, the conversation is stopped quietly.
///
/// # Errors
///
/// Returns the `GatewayError` if the group channel fails.
pub async fn offer_reveal(
    group: &dyn Conversation,
    insider: &str,
    timeout: Duration,
) -> Result<(), GatewayError> {
    let Ok(answer) = tokio::time::timeout(timeout, group.ask(text::REVEAL_PROMPT)).await else {
        info!("nobody answered the reveal prompt");
        group.stop().await;
        return Ok(());
    };

    let response = match RevealAnswer::parse(&answer?) {
        Some(RevealAnswer::Yes) => text::reveal_insider(insider),
        Some(RevealAnswer::No) => text::NO_REVEAL.to_owned(),
        None => text::alternate_case(text::REVEAL_FALLBACK),
    };
    group.say(&response).await
}
