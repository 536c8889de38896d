//! The session actor.
//!
//! One task owns a [`GameSession`]. Timers, the Master dialog and the vote
//! barrier report back through its inbox as [`SessionSignal`]s. The actor
//! handles one signal at a time and each handler makes exactly one aggregate
//! transition. A signal the aggregate rejects lost a race to another signal
//! and is dropped, so every phase is left exactly once.

use std::sync::Arc;

use insider_core::aggregate::AggregateRoot;
use insider_core::clock::Clock;
use insider_core::error::{DomainError, GatewayError};
use insider_core::event::DomainEvent;
use insider_core::gateway::{Conversation, DialogStatus, MessagingGateway};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::config::GameConfig;
use super::dialogs;
use super::slot::SlotLease;
use super::timers::{TimerKind, Timers};
use crate::domain::aggregates::{GameOutcome, GamePhase, GameSession};
use crate::domain::events::AbortReason;
use crate::domain::roles::RoleAssignment;
use crate::domain::text;

/// Something that happened outside the actor and may move the game on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    TimerFired(TimerKind),
    MasterDialogEnded(DialogStatus),
    /// The Master's prompts kept failing; the Master cannot be reached.
    MasterDialogFailed(GatewayError),
    VotesCollected(Vec<String>),
}

/// Shared services a session runs with.
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub config: GameConfig,
    pub clock: Arc<dyn Clock + Send + Sync>,
    pub gateway: Arc<dyn MessagingGateway>,
}

/// A running game.
#[derive(Debug)]
pub struct GameHandle {
    session_id: Uuid,
    task: JoinHandle<Result<GameOutcome, DomainError>>,
}

impl GameHandle {
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Waits for the game to end.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the session task panicked or
    /// ended without an outcome.
    pub async fn finished(self) -> Result<GameOutcome, DomainError> {
        self.task
            .await
            .map_err(|e| DomainError::Infrastructure(format!("game session task failed: {e}")))?
    }
}

/// Opens the game's conversations and spawns the actor.
///
/// `session` must already be started. On any failure the session is aborted
/// and the slot released before the error is returned.
pub(crate) async fn launch(
    mut session: GameSession,
    lease: SlotLease,
    correlation_id: Uuid,
    context: SessionContext,
) -> Result<GameHandle, DomainError> {
    let (Some(roles), Some(word)) = (session.roles().cloned(), session.word().map(str::to_owned))
    else {
        return Err(DomainError::Validation(
            "game session must be started before launch".to_owned(),
        ));
    };

    let channel = session.channel().to_owned();
    let group = match context.gateway.start_conversation(&channel).await {
        Ok(group) => group,
        Err(e) => {
            error!(error = %e, %channel, "group channel unreachable");
            if session
                .abort(AbortReason::GatewayFailure, correlation_id, context.clock.as_ref())
                .is_ok()
            {
                publish_events(&mut session);
            }
            lease.finish();
            return Err(e.into());
        }
    };

    let (signals, inbox) = mpsc::unbounded_channel();
    let mut actor = SessionActor {
        session,
        correlation_id,
        roles,
        word,
        context,
        group,
        master_dialog: None,
        vote_barrier: None,
        lease: Some(lease),
        timers: Timers::new(signals.clone()),
        signals,
        inbox,
    };
    actor.open().await?;

    let session_id = actor.session.id;
    let task = tokio::spawn(actor.run());
    Ok(GameHandle { session_id, task })
}

struct SessionActor {
    session: GameSession,
    correlation_id: Uuid,
    roles: RoleAssignment,
    word: String,
    context: SessionContext,
    group: Arc<dyn Conversation>,
    master_dialog: Option<Arc<dyn Conversation>>,
    vote_barrier: Option<JoinHandle<()>>,
    lease: Option<SlotLease>,
    timers: Timers,
    signals: mpsc::UnboundedSender<SessionSignal>,
    inbox: mpsc::UnboundedReceiver<SessionSignal>,
}

impl SessionActor {
    async fn open(&mut self) -> Result<(), DomainError> {
        self.publish();

        let gateway = Arc::clone(&self.context.gateway);
        if let Err(e) = dialogs::notify_insider(gateway.as_ref(), &self.roles.insider, &self.word).await
        {
            return Err(self.escalate(AbortReason::InsiderUnreachable, e).await);
        }

        let welcome = [
            text::WELCOME.to_owned(),
            text::master_is(&self.roles.master),
            text::game_starts(self.context.config.guess_duration),
        ];
        if let Err(e) = self.announce(&welcome).await {
            error!(error = %e, "could not welcome the group");
            self.abort(AbortReason::GatewayFailure).await;
            return Err(e.into());
        }

        let master = match gateway.start_private_conversation(&self.roles.master).await {
            Ok(master) => master,
            Err(e) => return Err(self.escalate(AbortReason::MasterUnreachable, e).await),
        };
        if let Err(e) = dialogs::notify_master(master.as_ref(), &self.word).await {
            return Err(self.escalate(AbortReason::MasterUnreachable, e).await);
        }
        let dialog = Arc::clone(&master);
        let signals = self.signals.clone();
        tokio::spawn(async move {
            let signal = match dialogs::master_dialog(dialog.as_ref()).await {
                Ok(status) => SessionSignal::MasterDialogEnded(status),
                Err(e) => SessionSignal::MasterDialogFailed(e),
            };
            let _ = signals.send(signal);
        });
        self.master_dialog = Some(master);

        self.timers
            .arm(TimerKind::Warning, self.context.config.warning_after);
        self.timers
            .arm(TimerKind::GuessPhase, self.context.config.guess_duration);

        info!(
            session_id = %self.session.id,
            correlation_id = %self.correlation_id,
            master = %self.roles.master,
            players = self.roles.players.len(),
            "guess phase started"
        );
        Ok(())
    }

    async fn run(mut self) -> Result<GameOutcome, DomainError> {
        while !self.session.phase().is_terminal() {
            let Some(signal) = self.inbox.recv().await else {
                break;
            };
            self.handle(signal).await;
        }
        self.session.outcome().cloned().ok_or_else(|| {
            DomainError::Infrastructure("game session ended without an outcome".to_owned())
        })
    }

    async fn handle(&mut self, signal: SessionSignal) {
        debug!(?signal, phase = %self.session.phase(), "session signal");
        match signal {
            SessionSignal::TimerFired(TimerKind::Warning) => self.on_warning().await,
            SessionSignal::TimerFired(TimerKind::GuessPhase) => self.on_guess_timeout().await,
            SessionSignal::TimerFired(TimerKind::VotePhase) => self.on_vote_timeout().await,
            SessionSignal::MasterDialogEnded(DialogStatus::Completed) => {
                self.on_word_guessed().await;
            }
            SessionSignal::MasterDialogEnded(DialogStatus::Stopped) => self.on_master_quit().await,
            SessionSignal::MasterDialogFailed(cause) => self.on_master_unreachable(cause).await,
            SessionSignal::VotesCollected(votes) => self.on_votes_collected(&votes).await,
        }
    }

    async fn on_warning(&mut self) {
        if self.session.phase() != GamePhase::GuessPhase {
            return;
        }
        let warning = text::time_warning(self.context.config.warning_remaining());
        if let Err(e) = self.group.say(&warning).await {
            error!(error = %e, "could not send the time warning");
            self.abort(AbortReason::GatewayFailure).await;
        }
    }

    async fn on_guess_timeout(&mut self) {
        if let Err(e) = self
            .session
            .expire_guess_time(self.correlation_id, self.context.clock.as_ref())
        {
            return ignore_stale("guess timeout", &e);
        }

        let lines = [
            text::guess_time_expired(&self.word),
            text::insider_was(&self.roles.insider),
        ];
        if let Err(e) = self.announce(&lines).await {
            warn!(error = %e, "could not announce the guess timeout");
        }
        self.finish().await;
    }

    async fn on_word_guessed(&mut self) {
        let guess = match self
            .session
            .complete_guess(self.correlation_id, self.context.clock.as_ref())
        {
            Ok(guess) => guess,
            Err(e) => return ignore_stale("word guessed", &e),
        };
        self.timers.cancel(TimerKind::Warning);
        self.timers.cancel(TimerKind::GuessPhase);
        self.publish();

        let gateway = Arc::clone(&self.context.gateway);
        let participants = self.roles.everyone();
        let signals = self.signals.clone();
        self.vote_barrier = Some(tokio::spawn(async move {
            let votes = dialogs::collect_votes(gateway, participants).await;
            let _ = signals.send(SessionSignal::VotesCollected(votes));
        }));
        self.timers
            .arm(TimerKind::VotePhase, guess.accusation_budget);
        info!(
            session_id = %self.session.id,
            elapsed_seconds = guess.elapsed_seconds,
            "accusation phase started"
        );

        let lines = [
            text::word_guessed(guess.elapsed_seconds),
            text::VOTES_REQUESTED.to_owned(),
        ];
        if let Err(e) = self.announce(&lines).await {
            error!(error = %e, "could not open the accusation phase");
            self.abort(AbortReason::GatewayFailure).await;
        }
    }

    async fn on_master_quit(&mut self) {
        if self.session.phase() != GamePhase::GuessPhase {
            debug!(phase = %self.session.phase(), "ignoring stale Master dialog end");
            return;
        }
        self.abort_with(AbortReason::MasterQuit, &[text::GAME_ENDED.to_owned()])
            .await;
    }

    async fn on_master_unreachable(&mut self, cause: GatewayError) {
        if self.session.phase() != GamePhase::GuessPhase {
            debug!(phase = %self.session.phase(), "ignoring stale Master dialog failure");
            return;
        }
        self.escalate(AbortReason::MasterUnreachable, cause).await;
    }

    async fn on_votes_collected(&mut self, votes: &[String]) {
        debug!(votes = votes.len(), "all votes collected");
        let tally = match self.session.record_votes(
            votes,
            self.correlation_id,
            self.context.clock.as_ref(),
        ) {
            Ok(tally) => tally,
            Err(e) => return ignore_stale("votes collected", &e),
        };

        let lines = text::tally_result(&tally, &self.roles.insider);
        if let Err(e) = self.announce(&lines).await {
            warn!(error = %e, "could not announce the vote result");
        }
        self.finish().await;
    }

    async fn on_vote_timeout(&mut self) {
        if let Err(e) = self
            .session
            .expire_vote_time(self.correlation_id, self.context.clock.as_ref())
        {
            return ignore_stale("vote timeout", &e);
        }
        // The slot is free again before the group is asked anything.
        self.finish().await;

        if let Err(e) = dialogs::offer_reveal(
            self.group.as_ref(),
            &self.roles.insider,
            self.context.config.reveal_timeout,
        )
        .await
        {
            warn!(error = %e, "reveal dialog failed");
        }
    }

    /// Aborts, telling the group something broke.
    async fn escalate(&mut self, reason: AbortReason, cause: GatewayError) -> DomainError {
        error!(error = %cause, ?reason, "participant unreachable, aborting game");
        self.abort_with(reason, &[text::SOMETHING_WENT_WRONG.to_owned()])
            .await;
        DomainError::Gateway(cause)
    }

    async fn abort(&mut self, reason: AbortReason) {
        self.abort_with(reason, &[]).await;
    }

    /// Aborts the session, announces `lines` and tears the session down.
    /// The slot is held until the announcement is out.
    async fn abort_with(&mut self, reason: AbortReason, lines: &[String]) {
        if let Err(e) = self
            .session
            .abort(reason, self.correlation_id, self.context.clock.as_ref())
        {
            return ignore_stale("abort", &e);
        }
        if let Err(e) = self.announce(lines).await {
            warn!(error = %e, ?reason, "could not announce the abort");
        }
        self.finish().await;
    }

    /// Teardown after the session reached a terminal phase.
    async fn finish(&mut self) {
        self.timers.cancel_all();
        if let Some(barrier) = self.vote_barrier.take() {
            barrier.abort();
        }
        if let Some(master) = self.master_dialog.take() {
            master.stop().await;
        }
        self.publish();
        if let Some(lease) = self.lease.take() {
            lease.finish();
        }
        info!(
            session_id = %self.session.id,
            phase = %self.session.phase(),
            outcome = ?self.session.outcome(),
            "game finished"
        );
    }

    async fn announce(&self, lines: &[String]) -> Result<(), GatewayError> {
        for line in lines {
            self.group.say(line).await?;
        }
        Ok(())
    }

    fn publish(&mut self) {
        publish_events(&mut self.session);
    }
}

fn ignore_stale(signal: &str, error: &DomainError) {
    debug!(%error, signal, "ignoring stale signal");
}

fn publish_events(session: &mut GameSession) {
    for event in session.take_uncommitted_events() {
        let meta = event.metadata();
        info!(
            session_id = %meta.aggregate_id,
            correlation_id = %meta.correlation_id,
            event_type = event.event_type(),
            sequence_number = meta.sequence_number,
            "domain event recorded"
        );
        debug!(event_type = event.event_type(), payload = %event.to_payload(), "domain event payload");
    }
}
