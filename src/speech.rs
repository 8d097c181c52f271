//! Synthesize-and-reply routine shared by the action and the command.
//!
//! Both triggers only differ in how they extract `(text, voice_id)` and in which
//! host primitive delivers the voice message. Everything else lives here.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::client::Synthesizer;
use crate::config::{VitsConfig, VitsSection};
use crate::error::{Result, VitsError};
use crate::logging::{LogSink, LOG_SOURCE};
use crate::runtime::PluginRuntime;
use crate::types::{
    text_preview, ExecutionOutcome, SynthesisRequest, SynthesisResult, VOICE_URL_MESSAGE_TYPE,
};

/// Reply sent when no text was supplied.
pub const MISSING_TEXT_REPLY: &str = "❌ Please provide the text to convert to speech";

/// Reply sent when synthesis failed.
pub const SYNTHESIS_FAILED_REPLY: &str =
    "❌ Speech synthesis failed, please check the network connection or try again later";

/// Reply sent when something unexpected went wrong.
pub const UNEXPECTED_ERROR_REPLY: &str = "❌ Speech synthesis error, please try again later";

/// Host primitive used to deliver the audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceDelivery {
    /// `send_custom`, used by the keyword action.
    Custom,
    /// `send_type`, used by the slash command.
    Typed,
}

/// Validate, synthesize and reply. Never fails: every error becomes a failed outcome.
///
/// Settings come from the host, key by key, falling back to `config`.
pub async fn speak_and_reply(
    runtime: &dyn PluginRuntime,
    synthesizer: &dyn Synthesizer,
    config: &VitsConfig,
    text: &str,
    voice_id: Option<&str>,
    delivery: VoiceDelivery,
) -> ExecutionOutcome {
    let log = runtime.log_sink();
    let run = run(runtime, synthesizer, log.as_ref(), config, text, voice_id, delivery);

    match AssertUnwindSafe(run).catch_unwind().await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => report_unexpected(runtime, log.as_ref(), err).await,
        Err(panic) => {
            let err = VitsError::Panic(panic_message(panic.as_ref()));
            report_unexpected(runtime, log.as_ref(), err).await
        }
    }
}

async fn run(
    runtime: &dyn PluginRuntime,
    synthesizer: &dyn Synthesizer,
    log: &dyn LogSink,
    config: &VitsConfig,
    text: &str,
    voice_id: Option<&str>,
    delivery: VoiceDelivery,
) -> Result<ExecutionOutcome> {
    let text = text.trim();
    if text.is_empty() {
        runtime.send_text(MISSING_TEXT_REPLY).await?;
        return Ok(ExecutionOutcome::failure(VitsError::EmptyText.to_string()));
    }

    let prefix = runtime.log_prefix();
    let settings = resolve_settings(runtime, log, config, &prefix);

    let actual = text.chars().count();
    if actual > settings.max_text_length {
        runtime
            .send_text(&format!(
                "❌ Text too long: {} characters (limit {})",
                actual, settings.max_text_length
            ))
            .await?;
        let err = VitsError::TextTooLong {
            limit: settings.max_text_length,
            actual,
        };
        return Ok(ExecutionOutcome::failure(err.to_string()));
    }

    let voice_id = voice_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(settings.default_voice_id.as_str())
        .to_string();

    log.log_info(
        LOG_SOURCE,
        &prefixed(
            &prefix,
            &format!(
                "Starting VITS synthesis, text: {}, voice id: {}",
                text_preview(text, 50),
                voice_id
            ),
        ),
    );

    let request = SynthesisRequest {
        text: text.to_string(),
        voice_id,
        language: settings.language,
        timeout_seconds: settings.timeout,
    };

    match synthesizer.synthesize(&settings.api_url, &request, log).await {
        SynthesisResult::AudioFile(file) => {
            let path = file.path.to_string_lossy();
            match delivery {
                VoiceDelivery::Custom => {
                    runtime.send_custom(VOICE_URL_MESSAGE_TYPE, &path).await?
                }
                VoiceDelivery::Typed => runtime.send_type(VOICE_URL_MESSAGE_TYPE, &path).await?,
            }
            log.log_info(LOG_SOURCE, &prefixed(&prefix, "VITS voice sent"));
            Ok(ExecutionOutcome::success(format!(
                "Generated and sent voice: {}",
                text_preview(text, 30)
            )))
        }
        SynthesisResult::Failure { reason } => {
            runtime.send_text(SYNTHESIS_FAILED_REPLY).await?;
            Ok(ExecutionOutcome::failure(format!(
                "Speech synthesis failed: {}",
                reason
            )))
        }
    }
}

async fn report_unexpected(
    runtime: &dyn PluginRuntime,
    log: &dyn LogSink,
    err: VitsError,
) -> ExecutionOutcome {
    log.log_error(
        LOG_SOURCE,
        &prefixed(&runtime.log_prefix(), &format!("VITS synthesis error: {}", err)),
    );
    if let Err(send_err) = runtime.send_text(UNEXPECTED_ERROR_REPLY).await {
        log.log_error(
            LOG_SOURCE,
            &format!("Failed to report error to chat: {}", send_err),
        );
    }
    ExecutionOutcome::failure(format!("Speech synthesis error: {}", err))
}

/// Host settings over `config`. Invalid merged settings are logged and `config` wins.
fn resolve_settings(
    runtime: &dyn PluginRuntime,
    log: &dyn LogSink,
    config: &VitsConfig,
    prefix: &str,
) -> VitsSection {
    let resolved = VitsConfig::from_runtime(runtime, config);
    match resolved.validate() {
        Ok(()) => resolved.vits,
        Err(err) => {
            log.log_warning(
                LOG_SOURCE,
                &prefixed(prefix, &format!("Ignoring host VITS settings: {}", err)),
            );
            config.vits.clone()
        }
    }
}

fn prefixed(prefix: &str, message: &str) -> String {
    if prefix.is_empty() {
        message.to_string()
    } else {
        format!("{} {}", prefix, message)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
