use async_trait::async_trait;

use crate::{
    domain::{ChannelId, InteractionRef, MessageRef},
    messaging::types::MessagingCapabilities,
    Result,
};

/// Outbound side of the chat platform.
///
/// Discord is the first implementation; handlers only talk to this trait so
/// they can be driven by a fake in tests.
#[async_trait]
pub trait ChatPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    /// Reply to `msg` without pinging its author.
    async fn reply(&self, msg: MessageRef, text: &str) -> Result<MessageRef>;

    /// Hide the link previews of `msg`. Needs the "manage messages" permission.
    async fn suppress_embeds(&self, msg: MessageRef) -> Result<()>;

    /// Post `text` to `channel` with every mention disabled.
    ///
    /// Text longer than `max_message_len` is an error, never truncated.
    async fn send(&self, channel: ChannelId, text: &str) -> Result<MessageRef>;

    async fn delete(&self, msg: MessageRef) -> Result<()>;

    /// Answer a command so that only the invoking user sees it.
    async fn respond_ephemeral(&self, interaction: InteractionRef, text: &str) -> Result<()>;
}
