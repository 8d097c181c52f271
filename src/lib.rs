//! elizaOS Plugin VITS - Rust Implementation
//!
//! Text-to-speech for chat bots backed by a remote
//! [vits-simple-api](https://github.com/Artrajz/vits-simple-api) server.
//! The plugin contributes two triggers that share one synthesize-and-reply routine:
//!
//! - a keyword action (`vits_tts_action`) activated by words such as "语音" or "tts"
//! - a slash command, `/vits <text> [voice_id]`
//!
//! The host is reached only through [`PluginRuntime`]: configuration lookup, reply
//! primitives and the log sink.
//!
//! # Example
//!
//! ```rust,ignore
//! use elizaos_plugin_vits::{get_vits_plugin, Command};
//!
//! async fn on_message(runtime: &dyn elizaos_plugin_vits::PluginRuntime, text: &str) -> anyhow::Result<()> {
//!     let plugin = get_vits_plugin()?.with_retries();
//!     if let Some(outcome) = plugin.command().handle_message(runtime, text).await {
//!         println!("{}: {}", outcome.success, outcome.message);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod actions;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod retry;
pub mod runtime;
pub mod speech;
pub mod types;

pub use actions::{Action, VitsTtsAction};
pub use client::{Synthesizer, VitsClient};
pub use commands::{Command, CommandMatch, VitsTtsCommand};
pub use config::VitsConfig;
pub use error::{ErrorKind, Result, VitsError};
pub use logging::{LogSink, MemoryLogSink, TracingLogSink};
pub use plugin::{create_plugin, get_vits_plugin, VitsTtsPlugin};
pub use retry::RetryingSynthesizer;
pub use runtime::PluginRuntime;
pub use speech::{speak_and_reply, VoiceDelivery};
pub use types::{
    AudioFile, ComponentInfo, ExecutionOutcome, FailureReason, SynthesisRequest,
    SynthesisResult,
};

/// Plugin metadata
pub const PLUGIN_NAME: &str = "vits_tts_plugin";
/// Plugin description
pub const PLUGIN_DESCRIPTION: &str =
    "VITS text-to-speech: converts text to voice messages through vits-simple-api";
/// Plugin version
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");
