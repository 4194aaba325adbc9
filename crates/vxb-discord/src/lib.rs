//! Discord adapter (serenity).
//!
//! This crate implements the `vxb-core` ChatPort over the Discord HTTP API and
//! feeds gateway events into the core dispatcher.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use serenity::{
    builder::{
        CreateAllowedMentions, CreateInteractionResponse, CreateInteractionResponseMessage,
        CreateMessage, EditMessage,
    },
    http::Http,
    model::application::CommandInteraction,
};

use tokio::sync::Mutex;

pub mod handlers;
pub mod router;

use vxb_core::{
    domain::{ChannelId, InteractionRef, MessageId, MessageRef},
    errors::Error,
    messaging::{port::ChatPort, types::MessagingCapabilities},
    Result,
};

/// Discord's maximum message content length in characters.
const MAX_DISCORD_LEN: usize = 2000;

/// Command interactions received from the gateway, parked until the
/// dispatcher answers them.
#[derive(Default)]
pub struct PendingInteractions {
    inner: Mutex<HashMap<u64, CommandInteraction>>,
}

impl PendingInteractions {
    pub async fn park(&self, interaction: CommandInteraction) -> InteractionRef {
        let id = interaction.id.get();
        self.inner.lock().await.insert(id, interaction);
        InteractionRef(id)
    }

    pub async fn take(&self, interaction: InteractionRef) -> Option<CommandInteraction> {
        self.inner.lock().await.remove(&interaction.0)
    }
}

#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<Http>,
    pending: Arc<PendingInteractions>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>, pending: Arc<PendingInteractions>) -> Self {
        Self { http, pending }
    }

    fn dc_channel(channel_id: ChannelId) -> serenity::model::id::ChannelId {
        serenity::model::id::ChannelId::new(channel_id.0)
    }

    fn dc_msg_id(message_id: MessageId) -> serenity::model::id::MessageId {
        serenity::model::id::MessageId::new(message_id.0)
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }
}

/// Cut `s` to at most `MAX_DISCORD_LEN` characters.
fn truncate(s: &str) -> &str {
    match s.char_indices().nth(MAX_DISCORD_LEN) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

#[async_trait]
impl ChatPort for DiscordMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: MAX_DISCORD_LEN,
        }
    }

    async fn reply(&self, msg: MessageRef, text: &str) -> Result<MessageRef> {
        let channel = Self::dc_channel(msg.channel_id);
        let builder = CreateMessage::new()
            .content(truncate(text))
            .reference_message((channel, Self::dc_msg_id(msg.message_id)))
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false));

        let sent = channel
            .send_message(&*self.http, builder)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            channel_id: msg.channel_id,
            message_id: MessageId(sent.id.get()),
        })
    }

    async fn suppress_embeds(&self, msg: MessageRef) -> Result<()> {
        Self::dc_channel(msg.channel_id)
            .edit_message(
                &*self.http,
                Self::dc_msg_id(msg.message_id),
                EditMessage::new().suppress_embeds(true),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        let len = text.chars().count();
        if len > MAX_DISCORD_LEN {
            return Err(Error::External(format!(
                "message of {len} characters exceeds the {MAX_DISCORD_LEN} limit"
            )));
        }
        let builder = CreateMessage::new()
            .content(text)
            .allowed_mentions(CreateAllowedMentions::new());

        let sent = Self::dc_channel(channel_id)
            .send_message(&*self.http, builder)
            .await
            .map_err(Self::map_err)?;

        Ok(MessageRef {
            channel_id,
            message_id: MessageId(sent.id.get()),
        })
    }

    async fn delete(&self, msg: MessageRef) -> Result<()> {
        Self::dc_channel(msg.channel_id)
            .delete_message(&*self.http, Self::dc_msg_id(msg.message_id))
            .await
            .map_err(Self::map_err)
    }

    async fn respond_ephemeral(&self, interaction: InteractionRef, text: &str) -> Result<()> {
        let Some(command) = self.pending.take(interaction).await else {
            return Err(Error::External(format!(
                "interaction {} is not pending (already answered or expired)",
                interaction.0
            )));
        };

        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(truncate(text))
                .ephemeral(true),
        );
        command
            .create_response(&*self.http, response)
            .await
            .map_err(Self::map_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messenger() -> DiscordMessenger {
        DiscordMessenger::new(
            Arc::new(Http::new("token")),
            Arc::new(PendingInteractions::default()),
        )
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("short"), "short");

        let long = "a".repeat(MAX_DISCORD_LEN + 10);
        assert_eq!(truncate(&long).len(), MAX_DISCORD_LEN);

        // Two bytes per char: a byte cap would keep only half of these.
        let wide = "é".repeat(MAX_DISCORD_LEN);
        assert_eq!(truncate(&wide), wide);

        let wider = "é".repeat(MAX_DISCORD_LEN + 1);
        assert_eq!(truncate(&wider).chars().count(), MAX_DISCORD_LEN);
    }

    #[tokio::test]
    async fn oversized_send_is_refused_before_any_request() {
        let m = messenger();
        assert_eq!(m.capabilities().max_message_len, MAX_DISCORD_LEN);

        let text = "a".repeat(MAX_DISCORD_LEN + 1);
        let err = m.send(ChannelId(1), &text).await.unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[tokio::test]
    async fn unknown_interaction_is_an_error() {
        let err = messenger()
            .respond_ephemeral(InteractionRef(1), "hi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not pending"));
    }
}
