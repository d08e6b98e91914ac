//! Slack Integration - slash command bot interface
//!
//! This crate provides the Slack side of the idea-meeting bot:
//! - **Slash Commands** (`commands`) - `/idea 요약하기`, `/idea 발상하기 <단어1> <단어2>`
//! - **Web API** (`web_api`) - `users.info`, `conversations.history`, `chat.postMessage`
//! - **Identity** (`identity`) - Slack user id → email
//! - **Dispatch** (`dispatch`) - long results split into sequential chunks
//! - **Jobs** (`jobs`) - fire-and-forget summary / synectics work
//! - **Signatures** (`signature`) - `X-Slack-Signature` verification
//!
//! # Architecture
//!
//! ```text
//! POST /slack/commands → CommandRouter ──ack──→ Slack (ephemeral / in_channel)
//!                             │
//!                        JobSpawner → JobRunner → Summarizer / IdeaGenerator
//!                                          ↓
//!                                  MessageDispatcher → chat.postMessage
//! ```
//!
//! # Key Types
//!
//! - `CommandRouter` - Parses the command, resolves identity, schedules jobs
//! - `JobRunner` - Runs one background job and reports failures to the channel
//! - `SlackApi` - Trait over the Slack Web API, implemented by `SlackWebClient`

pub mod commands;
pub mod dispatch;
pub mod identity;
pub mod jobs;
pub mod messages;
pub mod signature;
pub mod web_api;
