//! Single-consumer event loop.
//!
//! Messages and commands are handled one at a time in arrival order. The
//! dispatcher owns the settings store outright, so no locking is involved.
//! Handlers never fail: every error is logged and the loop moves on.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    config::RepostMode,
    domain::{InteractionRef, UserId},
    links::{find_links, Rewriter},
    messaging::{
        port::ChatPort,
        types::{CommandKind, IncomingCommand, IncomingEvent, IncomingMessage, Toggle},
    },
    settings::{PreferencePolicy, SettingsStore},
};

pub struct Dispatcher {
    store: SettingsStore,
    rewriter: Rewriter,
    port: Arc<dyn ChatPort>,
    repost_mode: RepostMode,
}

impl Dispatcher {
    pub fn new(
        store: SettingsStore,
        rewriter: Rewriter,
        port: Arc<dyn ChatPort>,
        repost_mode: RepostMode,
    ) -> Self {
        Self {
            store,
            rewriter,
            port,
            repost_mode,
        }
    }

    /// Consume events until every sender is dropped.
    pub async fn run(mut self, mut rx: mpsc::Receiver<IncomingEvent>) {
        tracing::info!(mode = ?self.repost_mode, "dispatcher started");
        while let Some(event) = rx.recv().await {
            self.handle(event).await;
        }
        tracing::info!("dispatcher stopped: event queue closed");
    }

    pub async fn handle(&mut self, event: IncomingEvent) {
        match event {
            IncomingEvent::Message(msg) => self.handle_message(msg).await,
            IncomingEvent::Command(cmd) => self.handle_command(cmd).await,
        }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    async fn handle_message(&self, msg: IncomingMessage) {
        if msg.author_is_bot || !self.store.is_enabled(msg.author_id) {
            return;
        }

        let originals: Vec<&str> = find_links(&msg.content).map(|m| m.raw).collect();
        if originals.is_empty() {
            return;
        }

        let rewritten = self.rewriter.rewrite_all(originals.iter().copied());
        if rewritten.is_empty() {
            return;
        }

        let delivered = match self.repost_mode {
            RepostMode::Reply => self.reply_with_links(&msg, &rewritten).await,
            RepostMode::Repost => self.repost_rewritten(&msg, &rewritten).await,
        };

        if delivered {
            tracing::info!(
                user = %msg.author_id,
                "rewrote links: {} -> {}",
                originals.join(", "),
                rewritten.join(", ")
            );
        }
    }

    async fn reply_with_links(&self, msg: &IncomingMessage, rewritten: &[String]) -> bool {
        let original = msg.message_ref();

        // Best effort: without "manage messages" both previews stay visible.
        if let Err(e) = self.port.suppress_embeds(original).await {
            tracing::warn!("could not suppress embeds on {:?}: {e}", original.message_id);
        }

        match self.port.reply(original, &rewritten.join("\n")).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("failed to reply with rewritten links: {e}");
                false
            }
        }
    }

    /// Repost first, delete second: if the repost fails the original survives.
    ///
    /// A repost that would not fit in one message falls back to a reply.
    async fn repost_rewritten(&self, msg: &IncomingMessage, rewritten: &[String]) -> bool {
        let Some(body) = self.rewriter.rewrite_text(&msg.content) else {
            return false;
        };
        let text = format!("{}: {body}", msg.author_name);

        let limit = self.port.capabilities().max_message_len;
        if text.chars().count() > limit {
            tracing::info!(
                "repost would exceed {limit} characters; replying instead of deleting {:?}",
                msg.message_id
            );
            return self.reply_with_links(msg, rewritten).await;
        }

        if let Err(e) = self.port.send(msg.channel_id, &text).await {
            tracing::error!("failed to repost rewritten message, keeping original: {e}");
            return false;
        }

        if let Err(e) = self.port.delete(msg.message_ref()).await {
            tracing::warn!("could not delete original message {:?}: {e}", msg.message_id);
        }
        true
    }

    async fn handle_command(&mut self, cmd: IncomingCommand) {
        let reply = match cmd.kind {
            CommandKind::Replace(toggle) => self.toggle(cmd.user_id, toggle).await,
            CommandKind::Status => self.status(cmd.user_id),
            CommandKind::Usage => USAGE_REPLY.to_string(),
        };
        self.respond(cmd.interaction, &reply).await;
    }

    async fn toggle(&mut self, user: UserId, toggle: Toggle) -> String {
        if self.store.policy() == PreferencePolicy::AlwaysOn {
            return ALWAYS_ON_REPLY.to_string();
        }

        self.store.set_enabled(user, toggle.is_on()).await;
        tracing::info!(user = %user, setting = toggle.as_str(), "preference updated");

        if toggle.is_on() {
            "Link replacement enabled. Your Twitter/X links will be rewritten.".to_string()
        } else {
            "Link replacement disabled.".to_string()
        }
    }

    fn status(&self, user: UserId) -> String {
        if self.store.policy() == PreferencePolicy::AlwaysOn {
            return ALWAYS_ON_REPLY.to_string();
        }

        if self.store.is_enabled(user) {
            "Link replacement is currently ON.".to_string()
        } else {
            "Link replacement is currently OFF.".to_string()
        }
    }

    async fn respond(&self, interaction: InteractionRef, text: &str) {
        if let Err(e) = self.port.respond_ephemeral(interaction, text).await {
            tracing::error!("failed to answer command: {e}");
        }
    }
}

const ALWAYS_ON_REPLY: &str = "Link replacement is always on for everyone on this bot.";
const USAGE_REPLY: &str = "Usage: `/replace setting:on` or `/replace setting:off`, and `/status`.";
