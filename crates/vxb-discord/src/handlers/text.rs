use serenity::model::channel::Message;

use vxb_core::{
    domain::{ChannelId, MessageId, UserId},
    messaging::types::IncomingMessage,
};

pub fn incoming_message(msg: &Message) -> IncomingMessage {
    let nick = msg.member.as_ref().and_then(|m| m.nick.as_deref());
    IncomingMessage {
        channel_id: ChannelId(msg.channel_id.get()),
        message_id: MessageId(msg.id.get()),
        author_id: UserId(msg.author.id.get()),
        author_name: display_name(nick, msg.author.global_name.as_deref(), &msg.author.name),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
    }
}

/// Server nickname, then global display name, then account name.
fn display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    [nick, global_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(username)
        .to_string()
}
