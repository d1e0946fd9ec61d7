pub mod reddit;

use anyhow::Result;
use async_trait::async_trait;

/// An unread inbox item addressed to the bot.
#[derive(Debug, Clone)]
pub struct Mention {
    /// Fullname used to mark the item read and to address the reply.
    pub id: String,
    /// Account that wrote the mention.
    pub author: String,
    /// Raw body text.
    pub body: String,
    /// Permalink of the originating comment, when there is one.
    pub context: String,
}

/// Port for the bot's inbox transport.
///
/// Reddit is the production implementation; tests substitute recording
/// doubles so processing order and escalation can be asserted.
#[async_trait]
pub trait Inbox: Send + Sync {
    /// Every currently unread inbox item.
    async fn unread_mentions(&self) -> Result<Vec<Mention>>;

    /// Acknowledge an item so it is never fetched again, even if processing
    /// it afterwards crashes.
    async fn mark_read(&self, mention: &Mention) -> Result<()>;

    /// Post a reply under the mentioned comment.
    async fn reply(&self, mention: &Mention, body: &str) -> Result<()>;

    /// Send a private message to a named account.
    async fn send_private_message(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}
