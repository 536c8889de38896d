//! Test gateway — an in-memory `MessagingGateway` driven by scripted replies.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use insider_core::error::GatewayError;
use insider_core::gateway::{Address, Conversation, InboundMessage, MessagingGateway};
use tokio::sync::watch;

/// A message the bot sent, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    /// Where the message went.
    pub to: Address,
    /// Message text (prompts included).
    pub text: String,
}

#[derive(Debug)]
struct ScriptedReply {
    text: String,
    delay: Duration,
}

/// Callback run for every message as it is sent.
#[derive(Clone)]
struct Observer(Arc<dyn Fn(&Sent) + Send + Sync>);

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Observer")
    }
}

#[derive(Debug, Default)]
struct Script {
    sent: Vec<Sent>,
    replies: HashMap<Address, VecDeque<ScriptedReply>>,
    unreachable: HashSet<Address>,
    failing_messages: HashSet<Address>,
    failing_prompts: HashSet<Address>,
    stopped: Vec<Address>,
    observer: Option<Observer>,
}

/// Records `sent`, then runs the observer outside the lock.
fn deliver(script: &Mutex<Script>, sent: Sent) {
    let observer = {
        let mut script = script.lock().unwrap();
        script.sent.push(sent.clone());
        script.observer.clone()
    };
    if let Some(Observer(observer)) = observer {
        observer(&sent);
    }
}

fn delivery_error(to: &Address) -> GatewayError {
    GatewayError::Delivery(format!("{to} is not accepting messages"))
}

/// A gateway that records every message and answers prompts from per-address
/// reply queues.
///
/// Each `ask` on a conversation pops the next reply queued for its address.
/// A reply may be delayed (tokio time, so paused-time tests stay instant).
/// An `ask` with nothing queued never resolves until its conversation is
/// stopped, which models a participant who does not answer.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    script: Arc<Mutex<Script>>,
}

impl ScriptedGateway {
    /// Creates a gateway with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an immediate reply for the next prompt sent to `to`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn script_reply(&self, to: Address, text: &str) {
        self.script_delayed_reply(to, text, Duration::ZERO);
    }

    /// Queues a reply that arrives `delay` after the prompt is sent.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn script_delayed_reply(&self, to: Address, text: &str, delay: Duration) {
        self.lock()
            .replies
            .entry(to)
            .or_default()
            .push_back(ScriptedReply {
                text: text.to_owned(),
                delay,
            });
    }

    /// Makes every attempt to open a conversation with `to` fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn make_unreachable(&self, to: Address) {
        self.lock().unreachable.insert(to);
    }

    /// Makes every `say` and `ask` to `to` fail with `GatewayError::Delivery`.
    /// Conversations still open.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_messages(&self, to: Address) {
        self.lock().failing_messages.insert(to);
    }

    /// Makes every `ask` to `to` fail with `GatewayError::Delivery` while
    /// plain messages still go through.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_prompts(&self, to: Address) {
        self.lock().failing_prompts.insert(to);
    }

    /// Runs `observer` for every message as it is sent, in sending order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn observe<F>(&self, observer: F)
    where
        F: Fn(&Sent) + Send + Sync + 'static,
    {
        self.lock().observer = Some(Observer(Arc::new(observer)));
    }

    /// Returns a snapshot of every message sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn sent(&self) -> Vec<Sent> {
        self.lock().sent.clone()
    }

    /// Returns the texts sent to one address, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn messages_to(&self, to: &Address) -> Vec<String> {
        self.lock()
            .sent
            .iter()
            .filter(|sent| &sent.to == to)
            .map(|sent| sent.text.clone())
            .collect()
    }

    /// Whether any conversation with `to` was stopped.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn was_stopped(&self, to: &Address) -> bool {
        self.lock().stopped.contains(to)
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    fn open(&self, address: Address) -> Result<Arc<dyn Conversation>, GatewayError> {
        if self.lock().unreachable.contains(&address) {
            return Err(GatewayError::DialogOpen {
                target: address.to_string(),
                reason: "user_not_found".to_owned(),
            });
        }
        let (stopped, _) = watch::channel(false);
        Ok(Arc::new(ScriptedConversation {
            address,
            script: Arc::clone(&self.script),
            stopped,
        }))
    }
}

#[async_trait]
impl MessagingGateway for ScriptedGateway {
    async fn start_conversation(
        &self,
        channel: &str,
    ) -> Result<Arc<dyn Conversation>, GatewayError> {
        self.open(Address::Channel(channel.to_owned()))
    }

    async fn start_private_conversation(
        &self,
        user: &str,
    ) -> Result<Arc<dyn Conversation>, GatewayError> {
        self.open(Address::User(user.to_owned()))
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<(), GatewayError> {
        deliver(
            &self.script,
            Sent {
                to: Address::Channel(message.channel.clone()),
                text: text.to_owned(),
            },
        );
        Ok(())
    }
}

#[derive(Debug)]
struct ScriptedConversation {
    address: Address,
    script: Arc<Mutex<Script>>,
    stopped: watch::Sender<bool>,
}

impl ScriptedConversation {
    fn record(&self, text: &str) -> Result<(), GatewayError> {
        if *self.stopped.borrow() {
            return Err(self.stopped_error());
        }
        if self.script.lock().unwrap().failing_messages.contains(&self.address) {
            return Err(delivery_error(&self.address));
        }
        deliver(
            &self.script,
            Sent {
                to: self.address.clone(),
                text: text.to_owned(),
            },
        );
        Ok(())
    }

    fn stopped_error(&self) -> GatewayError {
        GatewayError::ConversationStopped(self.address.to_string())
    }
}

#[async_trait]
impl Conversation for ScriptedConversation {
    fn recipient(&self) -> &Address {
        &self.address
    }

    async fn say(&self, text: &str) -> Result<(), GatewayError> {
        self.record(text)
    }

    async fn ask(&self, text: &str) -> Result<String, GatewayError> {
        if self.script.lock().unwrap().failing_prompts.contains(&self.address) {
            return Err(delivery_error(&self.address));
        }
        self.record(text)?;
        let reply = self
            .script
            .lock()
            .unwrap()
            .replies
            .get_mut(&self.address)
            .and_then(VecDeque::pop_front);
        let mut stopped = self.stopped.subscribe();

        match reply {
            Some(reply) if reply.delay.is_zero() => Ok(reply.text),
            Some(reply) => tokio::select! {
                () = tokio::time::sleep(reply.delay) => Ok(reply.text),
                _ = stopped.wait_for(|stopped| *stopped) => Err(self.stopped_error()),
            },
            None => {
                let _ = stopped.wait_for(|stopped| *stopped).await;
                Err(self.stopped_error())
            }
        }
    }

    async fn stop(&self) {
        self.stopped.send_replace(true);
        self.script.lock().unwrap().stopped.push(self.address.clone());
    }
}
