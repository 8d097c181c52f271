use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::actions::Action;
use crate::client::Synthesizer;
use crate::config::VitsConfig;
use crate::runtime::PluginRuntime;
use crate::speech::{speak_and_reply, VoiceDelivery};
use crate::types::{ActionInfo, ActivationType, ChatMode, ExecutionOutcome};

/// Words that activate the action. Matched case-insensitively.
pub const ACTIVATION_KEYWORDS: [&str; 7] = ["语音", "说话", "朗读", "念出来", "用语音说", "vits", "tts"];

/// Turns a message into speech when the user asks for a voice reply.
pub struct VitsTtsAction {
    synthesizer: Arc<dyn Synthesizer>,
    config: Arc<VitsConfig>,
}

impl VitsTtsAction {
    pub const NAME: &'static str = "vits_tts_action";

    /// `config` supplies every setting the host does not override.
    pub fn new(synthesizer: Arc<dyn Synthesizer>, config: Arc<VitsConfig>) -> Self {
        Self {
            synthesizer,
            config,
        }
    }
}

#[async_trait]
impl Action for VitsTtsAction {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn similes(&self) -> Vec<&'static str> {
        vec!["VITS_TTS", "TEXT_TO_SPEECH", "VOICE_REPLY", "READ_ALOUD"]
    }

    fn description(&self) -> &'static str {
        "Convert text to speech with the VITS model and send it as a voice message"
    }

    fn info(&self) -> ActionInfo {
        ActionInfo {
            name: Self::NAME.to_string(),
            description: self.description().to_string(),
            focus_activation_type: ActivationType::Keyword,
            normal_activation_type: ActivationType::Keyword,
            mode_enable: ChatMode::All,
            parallel_action: false,
            activation_keywords: ACTIVATION_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            keyword_case_sensitive: false,
            action_parameters: vec![
                ("text".to_string(), "Text to convert to speech".to_string()),
                (
                    "voice_id".to_string(),
                    "Voice id, optional, defaults to 0".to_string(),
                ),
            ],
            action_require: vec![
                "Use when the user asks for a voice reply".to_string(),
                "Use when the user says \"用语音说\" or \"念出来\"".to_string(),
                "Use when important information should be read aloud".to_string(),
            ],
            associated_types: vec!["text".to_string()],
        }
    }

    fn validate(&self, message_text: &str) -> bool {
        let lower = message_text.to_lowercase();
        ACTIVATION_KEYWORDS.iter().any(|k| lower.contains(k))
    }

    async fn handler(&self, runtime: &dyn PluginRuntime, params: &JsonValue) -> ExecutionOutcome {
        let text = param_string(params, "text").unwrap_or_default();
        let voice_id = param_string(params, "voice_id");

        speak_and_reply(
            runtime,
            self.synthesizer.as_ref(),
            &self.config,
            &text,
            voice_id.as_deref(),
            VoiceDelivery::Custom,
        )
        .await
    }
}

fn param_string(params: &JsonValue, key: &str) -> Option<String> {
    match params.get(key)? {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
