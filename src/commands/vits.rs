use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::client::Synthesizer;
use crate::commands::Command;
use crate::config::VitsConfig;
use crate::runtime::PluginRuntime;
use crate::speech::{speak_and_reply, VoiceDelivery};
use crate::types::{CommandInfo, ExecutionOutcome};

/// `/vits <text> [voice_id]`; a trailing run of digits is the voice id.
pub const COMMAND_PATTERN: &str = r"^/vits\s+(?P<text>.+?)(?:\s+(?P<voice_id>\d+))?$";

static COMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(COMMAND_PATTERN).expect("command pattern is valid"));

/// Parameters captured from a `/vits` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    pub text: String,
    /// Empty when omitted.
    pub voice_id: String,
}

/// Synthesizes the text given after `/vits`.
pub struct VitsTtsCommand {
    synthesizer: Arc<dyn Synthesizer>,
    config: Arc<VitsConfig>,
}

impl VitsTtsCommand {
    pub const NAME: &'static str = "vits_tts_command";

    /// `config` supplies every setting the host does not override.
    pub fn new(synthesizer: Arc<dyn Synthesizer>, config: Arc<VitsConfig>) -> Self {
        Self {
            synthesizer,
            config,
        }
    }

    pub fn parse(&self, message: &str) -> Option<CommandMatch> {
        let caps = COMMAND_RE.captures(message.trim())?;
        Some(CommandMatch {
            text: caps
                .name("text")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            voice_id: caps
                .name("voice_id")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    pub async fn execute(
        &self,
        runtime: &dyn PluginRuntime,
        matched: &CommandMatch,
    ) -> ExecutionOutcome {
        speak_and_reply(
            runtime,
            self.synthesizer.as_ref(),
            &self.config,
            &matched.text,
            Some(matched.voice_id.as_str()),
            VoiceDelivery::Typed,
        )
        .await
    }
}

#[async_trait]
impl Command for VitsTtsCommand {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn info(&self) -> CommandInfo {
        CommandInfo {
            name: Self::NAME.to_string(),
            description: "Convert text to speech with the VITS model".to_string(),
            command_pattern: COMMAND_PATTERN.to_string(),
            command_help: "/vits <text> [voice_id], e.g. /vits 你好世界 1".to_string(),
            command_examples: vec![
                "/vits 你好，世界！".to_string(),
                "/vits 今天天气不错 1".to_string(),
                "/vits こんにちは 2".to_string(),
            ],
            intercept_message: true,
        }
    }

    fn matches(&self, message: &str) -> bool {
        self.parse(message).is_some()
    }

    async fn handle_message(
        &self,
        runtime: &dyn PluginRuntime,
        message: &str,
    ) -> Option<ExecutionOutcome> {
        let matched = self.parse(message)?;
        Some(self.execute(runtime, &matched).await)
    }
}
