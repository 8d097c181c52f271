//! VITS API client.
//!
//! Builds the GET URL, downloads the clip, checks it is plausibly audio and writes
//! it to the transient directory. Exactly one attempt per call.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use uuid::Uuid;

use crate::error::{Result, VitsError};
use crate::logging::{LogSink, LOG_SOURCE};
use crate::types::{
    text_preview, AudioFile, SynthesisRequest, SynthesisResult, AUDIO_FILE_PREFIX,
    DEFAULT_AUDIO_FORMAT, MIN_AUDIO_BYTES,
};

/// Something that turns a request into an audio file.
///
/// Implemented by [`VitsClient`] and by decorators around it. Diagnostics go to the
/// sink of the invocation that issued the request.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize, keeping the typed error.
    async fn try_synthesize(
        &self,
        api_url: &str,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> Result<AudioFile>;

    /// Synthesize, collapsing every error into a [`SynthesisResult::Failure`].
    async fn synthesize(
        &self,
        api_url: &str,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> SynthesisResult {
        SynthesisResult::from(self.try_synthesize(api_url, request, log).await)
    }
}

#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn try_synthesize(
        &self,
        api_url: &str,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> Result<AudioFile> {
        (**self).try_synthesize(api_url, request, log).await
    }
}

/// HTTP client for vits-simple-api.
pub struct VitsClient {
    http: Client,
    output_dir: PathBuf,
    audio_format: String,
}

impl VitsClient {
    /// Create a client writing `.wav` files to the system temp directory.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("elizaos-plugin-vits/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(VitsError::Network)?;

        Ok(Self {
            http,
            output_dir: std::env::temp_dir(),
            audio_format: DEFAULT_AUDIO_FORMAT.to_string(),
        })
    }

    /// Write audio files into `dir` instead of the system temp directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the extension used for audio files.
    pub fn with_audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self
    }

    /// Directory audio files are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{api_url}?text={encoded}&id={voice_id}&lang={language}`
    pub fn build_request_url(api_url: &str, request: &SynthesisRequest) -> String {
        format!(
            "{}?text={}&id={}&lang={}",
            api_url,
            urlencoding::encode(&request.text),
            request.voice_id,
            request.language
        )
    }

    async fn fetch(&self, url: &str, timeout: Duration, log: &dyn LogSink) -> Result<Vec<u8>> {
        let seconds = timeout.as_secs();
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, seconds))?;

        let status = response.status();
        log.log_info(LOG_SOURCE, &format!("VITS API response status: {}", status.as_u16()));
        log.log_debug(LOG_SOURCE, &format!("Response headers: {:?}", response.headers()));

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log.log_error(
                LOG_SOURCE,
                &format!("VITS API call failed: {} - {}", status.as_u16(), body),
            );
            return Err(VitsError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        log.log_debug(LOG_SOURCE, &format!("Response content type: {}", content_type));

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, seconds))?;
        log.log_info(LOG_SOURCE, &format!("Received audio data: {} bytes", body.len()));

        Ok(body.to_vec())
    }

    async fn persist(&self, audio: &[u8], log: &dyn LogSink) -> Result<AudioFile> {
        let suffix = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}{}.{}",
            AUDIO_FILE_PREFIX,
            &suffix[..8],
            file_extension(&self.audio_format)
        );
        let path = self.output_dir.join(&file_name);
        let partial = self.output_dir.join(format!(".{}.part", file_name));

        write_then_rename(&partial, &path, audio).await?;
        let size_bytes = tokio::fs::metadata(&path).await?.len();

        log.log_info(
            LOG_SOURCE,
            &format!("VITS audio file written: {}", path.display()),
        );
        log.log_debug(LOG_SOURCE, &format!("File size: {} bytes", size_bytes));

        Ok(AudioFile { path, size_bytes })
    }
}

#[async_trait]
impl Synthesizer for VitsClient {
    async fn try_synthesize(
        &self,
        api_url: &str,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> Result<AudioFile> {
        if request.text.trim().is_empty() {
            return Err(VitsError::EmptyText);
        }

        let url = Self::build_request_url(api_url, request);
        log.log_info(LOG_SOURCE, &format!("Calling VITS API: {}", url));
        log.log_debug(
            LOG_SOURCE,
            &format!(
                "Request params - text: {}, voice id: {}, language: {}",
                text_preview(&request.text, 100),
                request.voice_id,
                request.language
            ),
        );

        let timeout = Duration::from_secs(request.timeout_seconds);
        let audio = match tokio::time::timeout(timeout, self.fetch(&url, timeout, log)).await {
            Ok(Ok(audio)) => audio,
            Ok(Err(err)) => {
                if !matches!(err, VitsError::Server { .. }) {
                    log.log_error(LOG_SOURCE, &format!("VITS API call failed: {}", err));
                }
                return Err(err);
            }
            Err(_) => {
                let err = VitsError::Timeout {
                    seconds: request.timeout_seconds,
                };
                log.log_error(
                    LOG_SOURCE,
                    &format!(
                        "VITS API call timed out (timeout: {}s)",
                        request.timeout_seconds
                    ),
                );
                return Err(err);
            }
        };

        if audio.len() < MIN_AUDIO_BYTES {
            log.log_error(
                LOG_SOURCE,
                &format!(
                    "Audio data too small, possibly corrupt: {} bytes",
                    audio.len()
                ),
            );
            return Err(VitsError::Integrity { size: audio.len() });
        }

        self.persist(&audio, log).await.map_err(|err| {
            log.log_error(LOG_SOURCE, &format!("Failed to write audio file: {}", err));
            err
        })
    }
}

fn transport_error(err: reqwest::Error, seconds: u64) -> VitsError {
    if err.is_timeout() {
        VitsError::Timeout { seconds }
    } else {
        VitsError::Network(err)
    }
}

/// Write `audio` to `partial` and move it to `path`. `partial` is removed on failure.
async fn write_then_rename(partial: &Path, path: &Path, audio: &[u8]) -> std::io::Result<()> {
    let written = match tokio::fs::write(partial, audio).await {
        Ok(()) => tokio::fs::rename(partial, path).await,
        Err(err) => Err(err),
    };
    if written.is_err() {
        let _ = tokio::fs::remove_file(partial).await;
    }
    written
}

fn file_extension(audio_format: &str) -> String {
    let ext: String = audio_format
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    if ext.is_empty() {
        DEFAULT_AUDIO_FORMAT.to_string()
    } else {
        ext
    }
}
