use crate::domain::{ChannelId, InteractionRef, MessageId, MessageRef, UserId};

/// Everything the dispatcher consumes, in arrival order.
#[derive(Clone, Debug)]
pub enum IncomingEvent {
    Message(IncomingMessage),
    Command(IncomingCommand),
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
}

impl IncomingMessage {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            channel_id: self.channel_id,
            message_id: self.message_id,
        }
    }
}

#[derive(Clone, Debug)]
pub struct IncomingCommand {
    pub interaction: InteractionRef,
    pub user_id: UserId,
    pub kind: CommandKind,
}

/// The two registered slash commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// `replace setting:<on|off>`
    Replace(Toggle),
    /// `status`
    Status,
    /// Unknown command or a missing/invalid `setting`; answered with usage help.
    Usage,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn as_str(self) -> &'static str {
        match self {
            Toggle::On => "on",
            Toggle::Off => "off",
        }
    }

    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

impl std::str::FromStr for Toggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "on" => Ok(Toggle::On),
            "off" => Ok(Toggle::Off),
            other => Err(format!("expected `on` or `off`, got `{other}`")),
        }
    }
}

/// Names of the registered commands and their option.
pub const REPLACE_COMMAND: &str = "replace";
pub const REPLACE_SETTING_OPTION: &str = "setting";
pub const STATUS_COMMAND: &str = "status";

impl CommandKind {
    /// Build a command from its registered name and the `setting` option value.
    pub fn parse(name: &str, setting: Option<&str>) -> Self {
        match name {
            REPLACE_COMMAND => setting
                .and_then(|s| s.parse().ok())
                .map_or(CommandKind::Usage, CommandKind::Replace),
            STATUS_COMMAND => CommandKind::Status,
            _ => CommandKind::Usage,
        }
    }
}

/// Capabilities of a chat port implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Longest message body the platform accepts, in characters.
    pub max_message_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registered_commands() {
        assert_eq!(
            CommandKind::parse("replace", Some("on")),
            CommandKind::Replace(Toggle::On)
        );
        assert_eq!(
            CommandKind::parse("replace", Some("OFF")),
            CommandKind::Replace(Toggle::Off)
        );
        assert_eq!(CommandKind::parse("status", None), CommandKind::Status);
    }

    #[test]
    fn unknown_or_incomplete_commands_get_usage() {
        assert_eq!(CommandKind::parse("replace", None), CommandKind::Usage);
        assert_eq!(CommandKind::parse("replace", Some("maybe")), CommandKind::Usage);
        assert_eq!(CommandKind::parse("help", None), CommandKind::Usage);
    }
}
