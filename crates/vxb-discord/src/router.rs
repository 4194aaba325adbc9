use std::sync::Arc;

use async_trait::async_trait;

use serenity::{
    model::{
        application::{Command, Interaction},
        channel::Message,
        gateway::Ready,
    },
    prelude::*,
};

use tokio::sync::mpsc;

use vxb_core::{
    config::Config,
    dispatch::Dispatcher,
    links::Rewriter,
    messaging::{
        port::ChatPort,
        types::{CommandKind, IncomingCommand, IncomingEvent},
    },
    settings::SettingsStore,
};

use crate::{handlers, DiscordMessenger, PendingInteractions};

/// Gateway event handler: converts events and queues them for the dispatcher.
pub struct Handler {
    events: mpsc::Sender<IncomingEvent>,
    pending: Arc<PendingInteractions>,
}

impl Handler {
    pub fn new(events: mpsc::Sender<IncomingEvent>, pending: Arc<PendingInteractions>) -> Self {
        Self { events, pending }
    }

    async fn enqueue(&self, event: IncomingEvent) {
        if self.events.send(event).await.is_err() {
            tracing::error!("dispatcher is gone; dropping event");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("logged in as {}", ready.user.name);

        match Command::set_global_commands(&ctx.http, handlers::registered_commands()).await {
            Ok(cmds) => tracing::info!("registered {} slash commands", cmds.len()),
            Err(e) => tracing::error!("failed to register slash commands: {e}"),
        }
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        // Bot authors are dropped by the dispatcher; skip the queue for them early.
        if msg.author.bot {
            return;
        }
        self.enqueue(IncomingEvent::Message(handlers::incoming_message(&msg)))
            .await;
    }

    async fn interaction_create(&self, _ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let (user_id, kind) = handlers::incoming_command(&command);
        if kind == CommandKind::Usage {
            tracing::warn!("unparseable invocation of `{}`", command.data.name);
        }

        let interaction = self.pending.park(command).await;
        self.enqueue(IncomingEvent::Command(IncomingCommand {
            interaction,
            user_id,
            kind,
        }))
        .await;
    }
}

/// Connect to the gateway and serve until the client stops.
///
/// Reconnects are handled by serenity; the dispatcher runs on its own task.
pub async fn run(cfg: Arc<Config>, store: SettingsStore) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let (tx, rx) = mpsc::channel(cfg.event_queue_capacity);
    let pending = Arc::new(PendingInteractions::default());

    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(Handler::new(tx, pending.clone()))
        .await?;

    let port: Arc<dyn ChatPort> = Arc::new(DiscordMessenger::new(client.http.clone(), pending));
    let dispatcher = Dispatcher::new(
        store,
        Rewriter::new(cfg.target_host.clone()),
        port,
        cfg.repost_mode,
    );
    tokio::spawn(dispatcher.run(rx));

    client.start().await?;
    Ok(())
}
