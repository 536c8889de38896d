//! A `MessagingGateway` over a text console.
//!
//! Input lines:
//!
//! - `alice: text` is a message from `alice` in the game channel
//! - `dm alice: text` is a direct message from `alice` to the bot
//! - `join #channel` adds the bot to a channel
//!
//! A line answers the oldest open prompt for its channel or user. A channel
//! line nobody was waiting for is a mention of the bot; an unexpected direct
//! message is dropped. Output lines read `[#channel] text` or `[@user] text`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use insider_core::error::GatewayError;
use insider_core::gateway::{Address, Conversation, InboundMessage, MessagingGateway};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// One parsed line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    Channel { user: String, text: String },
    Direct { user: String, text: String },
    Join(String),
}

/// Parses one input line. Returns `None` for blank or malformed lines.
#[must_use]
pub fn parse_line(line: &str) -> Option<ConsoleLine> {
    let line = line.trim();
    if let Some(channel) = line.strip_prefix("join ") {
        let channel = channel.trim().trim_start_matches('#');
        return (!channel.is_empty()).then(|| ConsoleLine::Join(channel.to_owned()));
    }

    let (speaker, text) = line.split_once(':')?;
    let text = text.trim().to_owned();
    if text.is_empty() {
        return None;
    }
    let mut words = speaker.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("dm"), Some(user), None) => Some(ConsoleLine::Direct {
            user: user.to_owned(),
            text,
        }),
        (Some(user), None, None) => Some(ConsoleLine::Channel {
            user: user.to_owned(),
            text,
        }),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Prompts {
    next_conversation: u64,
    waiting: HashMap<Address, VecDeque<(u64, oneshot::Sender<String>)>>,
}

impl Prompts {
    /// Drops waiters whose asking task is gone, and addresses nobody waits on.
    fn prune(&mut self) {
        self.waiting.retain(|_, queue| {
            queue.retain(|(_, waiter)| !waiter.is_closed());
            !queue.is_empty()
        });
    }
}

/// Console gateway. Everything the bot says is sent to the output channel
/// returned by [`ConsoleGateway::new`] as a formatted line.
#[derive(Debug, Clone)]
pub struct ConsoleGateway {
    channel: String,
    prompts: Arc<Mutex<Prompts>>,
    output: mpsc::UnboundedSender<String>,
}

impl ConsoleGateway {
    #[must_use]
    pub fn new(channel: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (output, lines) = mpsc::unbounded_channel();
        let gateway = Self {
            channel: channel.into(),
            prompts: Arc::default(),
            output,
        };
        (gateway, lines)
    }

    /// Delivers a line to whoever is waiting for it. Returns the message the
    /// bot should treat as a mention, if the line was not an answer.
    #[must_use]
    pub fn route(&self, line: ConsoleLine) -> Option<InboundMessage> {
        match line {
            ConsoleLine::Channel { user, text } => {
                let address = Address::Channel(self.channel.clone());
                match self.answer(&address, text) {
                    Ok(()) => None,
                    Err(text) => Some(InboundMessage {
                        channel: self.channel.clone(),
                        user,
                        text,
                    }),
                }
            }
            ConsoleLine::Direct { user, text } => {
                if self.answer(&Address::User(user.clone()), text).is_err() {
                    debug!(%user, "direct message nobody was waiting for");
                }
                None
            }
            ConsoleLine::Join(_) => None,
        }
    }

    /// Hands `text` to the oldest live prompt for `address`, or gives it back.
    fn answer(&self, address: &Address, mut text: String) -> Result<(), String> {
        let mut prompts = self.prompts();
        let Some(queue) = prompts.waiting.get_mut(address) else {
            return Err(text);
        };
        while let Some((_, waiter)) = queue.pop_front() {
            match waiter.send(text) {
                Ok(()) => return Ok(()),
                // The asking task was abandoned; try the next prompt.
                Err(returned) => text = returned,
            }
        }
        Err(text)
    }

    fn prompts(&self) -> MutexGuard<'_, Prompts> {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn print(&self, to: &Address, text: &str) -> Result<(), GatewayError> {
        self.output
            .send(format!("[{to}] {text}"))
            .map_err(|_| GatewayError::Delivery("console output is closed".to_owned()))
    }

    fn open(&self, address: Address) -> Arc<dyn Conversation> {
        let id = {
            let mut prompts = self.prompts();
            prompts.next_conversation += 1;
            prompts.next_conversation
        };
        Arc::new(ConsoleConversation {
            id,
            address,
            gateway: self.clone(),
            stopped: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MessagingGateway for ConsoleGateway {
    async fn start_conversation(
        &self,
        channel: &str,
    ) -> Result<Arc<dyn Conversation>, GatewayError> {
        Ok(self.open(Address::Channel(channel.to_owned())))
    }

    async fn start_private_conversation(
        &self,
        user: &str,
    ) -> Result<Arc<dyn Conversation>, GatewayError> {
        Ok(self.open(Address::User(user.to_owned())))
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<(), GatewayError> {
        self.print(&Address::Channel(message.channel.clone()), text)
    }
}

#[derive(Debug)]
struct ConsoleConversation {
    id: u64,
    address: Address,
    gateway: ConsoleGateway,
    stopped: AtomicBool,
}

impl ConsoleConversation {
    fn stopped_error(&self) -> GatewayError {
        GatewayError::ConversationStopped(self.address.to_string())
    }
}

#[async_trait]
impl Conversation for ConsoleConversation {
    fn recipient(&self) -> &Address {
        &self.address
    }

    async fn say(&self, text: &str) -> Result<(), GatewayError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(self.stopped_error());
        }
        self.gateway.print(&self.address, text)
    }

    async fn ask(&self, text: &str) -> Result<String, GatewayError> {
        let (waiter, answer) = oneshot::channel();
        {
            let mut prompts = self.gateway.prompts();
            // Checked under the lock so `stop` cannot slip in between.
            if self.stopped.load(Ordering::SeqCst) {
                return Err(self.stopped_error());
            }
            prompts.prune();
            prompts
                .waiting
                .entry(self.address.clone())
                .or_default()
                .push_back((self.id, waiter));
        }
        self.gateway.print(&self.address, text)?;
        answer.await.map_err(|_| self.stopped_error())
    }

    async fn stop(&self) {
        let mut prompts = self.gateway.prompts();
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(queue) = prompts.waiting.get_mut(&self.address) {
            queue.retain(|(owner, _)| *owner != self.id);
        }
        prompts.prune();
    }
}
