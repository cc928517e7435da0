//! Slack integration - slash-command webhook surface
//!
//! This crate provides the Slack-facing pieces of pikabot:
//! - **Slash Commands** (`commands`) - payload parsing, `/score` and `/mark` routing
//! - **Signatures** (`signature`) - `X-Slack-Signature` v0 request verification
//! - **Messages** (`message`) - JSON response bodies posted back to the channel
//! - **Shout** (`shout`) - the case-flipping text transform behind `/mark`
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Add slash commands `/score` and `/mark` pointing at the server's `/` endpoint
//! 3. Set env vars: `PIKABOT_SLACK_SIGNING_SECRET`, `PIKABOT_SCORES_PATH`
//!
//! # Architecture
//!
//! ```text
//! HTTP body → SignatureVerifier → SlashCommandPayload → CommandRouter → Scoreboard
//!                                                            ↓
//!                                                  SlashResponse (JSON)
//! ```

pub mod commands;
pub mod message;
pub mod shout;
pub mod signature;
