use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::identity::IdentityResolver;
use crate::jobs::JobSpawner;
use crate::messages::{
    synectics_pending_text, ResultKind, EMAIL_UNRESOLVED_TEXT, HELP_TEXT, SUMMARIZE_KEYWORD,
    SUMMARY_PENDING_TEXT, SYNECTICS_KEYWORD, SYNECTICS_USAGE_TEXT,
};

/// The form fields of a Slack slash-command request the bot reads. Slack sends
/// many more; they are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct SlashCommandPayload {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKeyword {
    Summarize,
    Synectics,
    Invalid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub keyword: CommandKeyword,
    pub args: Vec<String>,
}

pub fn parse_command(text: &str) -> ParsedCommand {
    let mut parts = text.split_whitespace();
    let keyword = match parts.next() {
        Some(SUMMARIZE_KEYWORD) => CommandKeyword::Summarize,
        Some(SYNECTICS_KEYWORD) => CommandKeyword::Synectics,
        _ => CommandKeyword::Invalid,
    };
    ParsedCommand { keyword, args: parts.map(str::to_owned).collect() }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Ephemeral,
    InChannel,
}

/// Synchronous reply to a slash command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashCommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl SlashCommandResponse {
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::Ephemeral, text: text.into() }
    }

    pub fn in_channel(text: impl Into<String>) -> Self {
        Self { response_type: ResponseType::InChannel, text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackgroundJob {
    Summarize { channel_id: String, email: String },
    Synectics { channel_id: String, word_a: String, word_b: String },
}

impl BackgroundJob {
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::Summarize { .. } => ResultKind::Summary,
            Self::Synectics { .. } => ResultKind::Synectics,
        }
    }

    pub fn channel_id(&self) -> &str {
        match self {
            Self::Summarize { channel_id, .. } | Self::Synectics { channel_id, .. } => channel_id,
        }
    }
}

/// Outcome of routing one command: the reply Slack gets right away, and the
/// work to run after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandAck {
    pub response: SlashCommandResponse,
    pub job: Option<BackgroundJob>,
}

impl CommandAck {
    fn reply(response: SlashCommandResponse) -> Self {
        Self { response, job: None }
    }
}

pub struct CommandRouter {
    identity: Arc<dyn IdentityResolver>,
    spawner: Arc<dyn JobSpawner>,
}

impl CommandRouter {
    pub fn new(identity: Arc<dyn IdentityResolver>, spawner: Arc<dyn JobSpawner>) -> Self {
        Self { identity, spawner }
    }

    /// Decides the reply and the background job for a payload without
    /// scheduling anything.
    pub async fn route(&self, payload: &SlashCommandPayload) -> CommandAck {
        debug!(
            event_name = "slack.command.received",
            command = %payload.command,
            channel_id = %payload.channel_id,
            user_id = %payload.user_id,
            "slash command received"
        );

        let parsed = parse_command(&payload.text);
        if parsed.keyword == CommandKeyword::Invalid {
            return CommandAck::reply(SlashCommandResponse::ephemeral(HELP_TEXT));
        }

        let Some(email) = self.identity.resolve(&payload.user_id).await.email else {
            return CommandAck::reply(SlashCommandResponse::ephemeral(EMAIL_UNRESOLVED_TEXT));
        };

        match parsed.keyword {
            CommandKeyword::Summarize => CommandAck {
                response: SlashCommandResponse::in_channel(SUMMARY_PENDING_TEXT),
                job: Some(BackgroundJob::Summarize {
                    channel_id: payload.channel_id.clone(),
                    email,
                }),
            },
            CommandKeyword::Synectics => match parsed.args.as_slice() {
                [word_a, word_b, ..] => CommandAck {
                    response: SlashCommandResponse::in_channel(synectics_pending_text(
                        word_a, word_b,
                    )),
                    job: Some(BackgroundJob::Synectics {
                        channel_id: payload.channel_id.clone(),
                        word_a: word_a.clone(),
                        word_b: word_b.clone(),
                    }),
                },
                _ => CommandAck::reply(SlashCommandResponse::ephemeral(SYNECTICS_USAGE_TEXT)),
            },
            CommandKeyword::Invalid => {
                CommandAck::reply(SlashCommandResponse::ephemeral(HELP_TEXT))
            }
        }
    }

    /// Routes the payload, hands any job to the spawner and returns the reply.
    pub async fn handle(&self, payload: SlashCommandPayload) -> SlashCommandResponse {
        let CommandAck { response, job } = self.route(&payload).await;

        if let Some(job) = job {
            info!(
                event_name = "slack.command.job_scheduled",
                kind = job.kind().label(),
                channel_id = %job.channel_id(),
                user_id = %payload.user_id,
                "background job scheduled"
            );
            self.spawner.spawn(job);
        }

        response
    }
}
