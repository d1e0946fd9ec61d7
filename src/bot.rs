use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::command::{Command, CommandParser};
use crate::config::{Config, Environment};
use crate::lock::RunningFile;
use crate::notify::{Mailer, Notifier};
use crate::platform::{Inbox, Mention};
use crate::random_org::{RngError, RngService};
use crate::reply;

/// The polling bot: watches the inbox for command mentions, draws signed
/// random integers, and replies with the numbers and verification payload.
pub struct Bot {
    inbox: Arc<dyn Inbox>,
    rng: Arc<dyn RngService>,
    notifier: Notifier,
    parser: CommandParser,
    maintainer: String,
    environment: Environment,
    running_file: RunningFile,
    poll_interval: Duration,
}

impl Bot {
    pub fn new(
        config: &Config,
        inbox: Arc<dyn Inbox>,
        rng: Arc<dyn RngService>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let notifier = Notifier::new(
            inbox.clone(),
            mailer,
            config.bot.operator_user.clone(),
            config.bot.operator_email.clone(),
        );
        Self {
            parser: CommandParser::new(&config.reddit.username),
            maintainer: config.bot.operator_user.clone(),
            environment: config.bot.environment,
            running_file: RunningFile::new(config.bot.running_file.clone()),
            poll_interval: Duration::from_secs(config.bot.poll_interval_secs),
            notifier,
            inbox,
            rng,
        }
    }

    /// Run until the running file disappears. At most one instance may hold
    /// the running file at a time.
    pub async fn run(&self) -> Result<()> {
        info!("start");

        if self.environment == Environment::Dev && self.running_file.exists() {
            // The file could belong to a live instance; dev mode assumes the
            // operator knows it doesn't.
            warn!(
                "Removing existing running file {} (dev mode); \
                 another instance may still hold it",
                self.running_file.path().display()
            );
            self.running_file.remove()?;
        }

        if self.running_file.exists() {
            error!("randombot already running! Will not start.");
            return Ok(());
        }
        self.running_file.create()?;

        while self.running_file.exists() {
            info!("Start main loop");
            match self.check_mentions().await {
                Ok(()) => info!("End main loop"),
                Err(err) => {
                    // The loop outlives any single bad cycle.
                    error!("Unknown exception in main loop: {:#}", err);
                    self.notifier
                        .alert(
                            "Unknown exception in main loop",
                            &format!("Error: {:#}", err),
                        )
                        .await;
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        info!("end");
        Ok(())
    }

    /// One polling cycle: fetch every unread mention and process each in
    /// order.
    async fn check_mentions(&self) -> Result<()> {
        let mentions = self
            .inbox
            .unread_mentions()
            .await
            .context("Failed to fetch unread mentions")?;

        if !mentions.is_empty() {
            info!("Fetched {} unread mention(s)", mentions.len());
        }

        for mention in &mentions {
            self.process_mention(mention).await?;
        }

        Ok(())
    }

    async fn process_mention(&self, mention: &Mention) -> Result<()> {
        // Mark read before anything else so a crash mid-processing cannot
        // make the bot retry the same mention forever.
        self.inbox
            .mark_read(mention)
            .await
            .with_context(|| format!("Failed to mark {} read", mention.id))?;

        let Some(command) = self.parser.parse(&mention.body) else {
            debug!(
                "Ignoring non-command mention {} from {}",
                mention.id, mention.author
            );
            return Ok(());
        };

        info!(
            "Processing {:?} from {} ({})",
            command, mention.author, mention.id
        );

        match self
            .rng
            .signed_integers(command.count(), 1, command.slots())
            .await
        {
            Ok(result) => {
                let body = reply::compose(&command, &result, &self.maintainer);
                self.inbox
                    .reply(mention, &body)
                    .await
                    .with_context(|| format!("Failed to reply to {}", mention.id))?;
                info!("Replied to {} with {:?}", mention.id, result.random.data);
            }
            Err(err) => self.handle_draw_failure(mention, &command, err).await,
        }

        Ok(())
    }

    async fn handle_draw_failure(&self, mention: &Mention, command: &Command, err: RngError) {
        error!(
            "Error getting random nums {} {} for {}: {:#}",
            command.count(),
            command.slots(),
            mention.id,
            err
        );

        if command.slots() <= 1 {
            // Caller error, not a system fault: tell the requester, skip the
            // operator.
            if let Err(reply_err) = self.inbox.reply(mention, reply::INVALID_SLOTS_MESSAGE).await {
                error!(
                    "Failed to send invalid-slots reply to {}: {:#}",
                    mention.id, reply_err
                );
            }
            return;
        }

        // The requester hears about the failure before the operator does.
        if let Err(reply_err) = self.inbox.reply(mention, reply::RETRY_MESSAGE).await {
            error!(
                "Failed to send retry reply to {}: {:#}",
                mention.id, reply_err
            );
        }

        let detail = format!(
            "Error getting random nums {} {} for mention {}: {}",
            command.count(),
            command.slots(),
            mention.id,
            err
        );
        self.notifier.alert("Error getting random nums", &detail).await;
    }
}
