use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::application::{CommandInteraction, CommandOptionType},
};

use vxb_core::{
    domain::UserId,
    messaging::types::{CommandKind, REPLACE_COMMAND, REPLACE_SETTING_OPTION, STATUS_COMMAND},
};

/// Global slash commands: `replace setting:<on|off>` and `status`.
pub fn registered_commands() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new(REPLACE_COMMAND)
            .description("Turn automatic Twitter/X link replacement on or off")
            .add_option(
                CreateCommandOption::new(
                    CommandOptionType::String,
                    REPLACE_SETTING_OPTION,
                    "on or off",
                )
                .required(true)
                .add_string_choice("on", "on")
                .add_string_choice("off", "off"),
            ),
        CreateCommand::new(STATUS_COMMAND)
            .description("Show whether link replacement is on for you"),
    ]
}

/// Decode a command invocation. Anything unparseable becomes `CommandKind::Usage`.
pub fn incoming_command(command: &CommandInteraction) -> (UserId, CommandKind) {
    let setting = command
        .data
        .options
        .iter()
        .find(|o| o.name == REPLACE_SETTING_OPTION)
        .and_then(|o| o.value.as_str());

    let kind = CommandKind::parse(&command.data.name, setting);
    (UserId(command.user.id.get()), kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_replace_and_status() {
        let cmds: Vec<serde_json::Value> = registered_commands()
            .iter()
            .map(|c| serde_json::to_value(c).unwrap())
            .collect();

        assert_eq!(cmds.len(), 2);
        assert_eq!(cmds[0]["name"], "replace");
        assert_eq!(cmds[0]["options"][0]["name"], "setting");
        assert_eq!(cmds[0]["options"][0]["required"], true);
        let choices: Vec<&str> = cmds[0]["options"][0]["choices"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["value"].as_str().unwrap())
            .collect();
        assert_eq!(choices, vec!["on", "off"]);

        assert_eq!(cmds[1]["name"], "status");
        assert!(cmds[1].get("options").map_or(true, |o| o.as_array().unwrap().is_empty()));
    }
}
