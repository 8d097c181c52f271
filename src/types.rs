#![allow(missing_docs)]
//! Type definitions for the VITS plugin.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, VitsError};

/// Default vits-simple-api endpoint.
pub const DEFAULT_API_URL: &str = "https://artrajz-vits-simple-api.hf.space/voice/vits";

/// Default voice id.
pub const DEFAULT_VOICE_ID: &str = "0";

/// Default synthesis language.
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default maximum text length in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 500;

/// Default retry count (only honoured by the retry decorator).
pub const DEFAULT_RETRY_COUNT: u32 = 2;

/// Default audio format.
pub const DEFAULT_AUDIO_FORMAT: &str = "wav";

/// Smallest body accepted as a synthesized clip.
pub const MIN_AUDIO_BYTES: usize = 100;

/// Prefix of generated audio file names.
pub const AUDIO_FILE_PREFIX: &str = "vits_tts_";

/// Host message type used to deliver a local audio file.
pub const VOICE_URL_MESSAGE_TYPE: &str = "voiceurl";

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn text_preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// One synthesis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak.
    pub text: String,
    /// Speaker id understood by the API.
    pub voice_id: String,
    /// Language code.
    pub language: String,
    /// End-to-end timeout.
    pub timeout_seconds: u64,
}

impl SynthesisRequest {
    /// Create a request with default language and timeout.
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set the language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// A synthesized clip persisted to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFile {
    /// Location of the file.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub size_bytes: u64,
}

/// Why a synthesis did not produce audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    MissingText,
    TextTooLong,
    Timeout,
    Transport,
    Server,
    Integrity,
    Unexpected,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::MissingText => "missing text",
            Self::TextTooLong => "text too long",
            Self::Timeout => "timeout",
            Self::Transport => "transport error",
            Self::Server => "server error",
            Self::Integrity => "corrupt audio",
            Self::Unexpected => "unexpected error",
        };
        f.write_str(s)
    }
}

impl From<&VitsError> for FailureReason {
    fn from(err: &VitsError) -> Self {
        match err {
            VitsError::EmptyText => Self::MissingText,
            VitsError::TextTooLong { .. } => Self::TextTooLong,
            VitsError::Timeout { .. } => Self::Timeout,
            VitsError::Server { .. } => Self::Server,
            VitsError::Integrity { .. } => Self::Integrity,
            other => match other.kind() {
                ErrorKind::Transport => Self::Transport,
                _ => Self::Unexpected,
            },
        }
    }
}

/// Outcome of a synthesis as seen by callers: a file, or a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisResult {
    /// Audio written to disk.
    AudioFile(AudioFile),
    /// No audio; details went to the log.
    Failure {
        /// Failure class.
        reason: FailureReason,
    },
}

impl SynthesisResult {
    /// Whether audio was produced.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::AudioFile(_))
    }

    /// The audio file, if any.
    pub fn audio_file(&self) -> Option<&AudioFile> {
        match self {
            Self::AudioFile(file) => Some(file),
            Self::Failure { .. } => None,
        }
    }
}

impl From<crate::error::Result<AudioFile>> for SynthesisResult {
    fn from(result: crate::error::Result<AudioFile>) -> Self {
        match result {
            Ok(file) => Self::AudioFile(file),
            Err(err) => Self::Failure {
                reason: FailureReason::from(&err),
            },
        }
    }
}

/// What an adapter reports back to the host: `(success, message)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the invocation succeeded.
    pub success: bool,
    /// Summary or diagnostic.
    pub message: String,
}

impl ExecutionOutcome {
    /// Successful outcome.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Failed outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// How a component is activated in a given chat mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationType {
    Never,
    Always,
    Random,
    Keyword,
}

/// Chat modes a component participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    Focus,
    Normal,
    All,
}

/// Registration metadata for a keyword action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub name: String,
    pub description: String,
    pub focus_activation_type: ActivationType,
    pub normal_activation_type: ActivationType,
    pub mode_enable: ChatMode,
    pub parallel_action: bool,
    pub activation_keywords: Vec<String>,
    pub keyword_case_sensitive: bool,
    /// Parameter name to description.
    pub action_parameters: Vec<(String, String)>,
    pub action_require: Vec<String>,
    pub associated_types: Vec<String>,
}

/// Registration metadata for a slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub command_pattern: String,
    pub command_help: String,
    pub command_examples: Vec<String>,
    pub intercept_message: bool,
}

/// A component the host wires into its dispatch tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component_type", rename_all = "snake_case")]
pub enum ComponentInfo {
    Action(ActionInfo),
    Command(CommandInfo),
}

impl ComponentInfo {
    /// Component name.
    pub fn name(&self) -> &str {
        match self {
            Self::Action(info) => &info.name,
            Self::Command(info) => &info.name,
        }
    }
}
