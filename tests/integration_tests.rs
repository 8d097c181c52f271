//! End-to-end tests against a stubbed vits-simple-api server.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use elizaos_plugin_vits::logging::LogLevel;
use elizaos_plugin_vits::speech::SYNTHESIS_FAILED_REPLY;
use elizaos_plugin_vits::{
    create_plugin, Action, Command, LogSink, MemoryLogSink, PluginRuntime, VitsClient,
    VitsConfig, VitsTtsPlugin,
};

const VOICE_PATH: &str = "/voice/vits";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sent {
    Text(String),
    Custom(String, String),
    Typed(String, String),
}

struct TestRuntime {
    config: Option<VitsConfig>,
    sent: Mutex<Vec<Sent>>,
    log: Arc<MemoryLogSink>,
}

impl TestRuntime {
    fn new(config: VitsConfig, log: Arc<MemoryLogSink>) -> Self {
        Self {
            config: Some(config),
            sent: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Runtime that has no `vits.*` settings of its own.
    fn without_settings(log: Arc<MemoryLogSink>) -> Self {
        Self {
            config: None,
            sent: Mutex::new(Vec::new()),
            log,
        }
    }

    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn voice_paths(&self) -> Vec<PathBuf> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Custom(_, p) | Sent::Typed(_, p) => Some(PathBuf::from(p)),
                Sent::Text(_) => None,
            })
            .collect()
    }

    fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PluginRuntime for TestRuntime {
    fn get_config(&self, key: &str) -> Option<JsonValue> {
        self.config.as_ref()?.get(key)
    }

    async fn send_text(&self, text: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_custom(&self, message_type: &str, content: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Custom(message_type.to_string(), content.to_string()));
        Ok(())
    }

    async fn send_type(&self, message_type: &str, content: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Typed(message_type.to_string(), content.to_string()));
        Ok(())
    }

    fn log_sink(&self) -> Arc<dyn LogSink> {
        self.log.clone()
    }
}

struct Harness {
    server: MockServer,
    runtime: TestRuntime,
    plugin: VitsTtsPlugin,
    log: Arc<MemoryLogSink>,
    output: TempDir,
}

async fn harness(configure: impl FnOnce(VitsConfig) -> VitsConfig) -> Harness {
    let server = MockServer::start().await;
    let config = configure(
        VitsConfig::default().with_api_url(format!("{}{}", server.uri(), VOICE_PATH)),
    );
    let log = Arc::new(MemoryLogSink::new());
    let output = tempfile::tempdir().unwrap();

    let client = VitsClient::new().unwrap().with_output_dir(output.path());
    let plugin = create_plugin(config.clone())
        .unwrap()
        .with_synthesizer(Arc::new(client));

    Harness {
        server,
        runtime: TestRuntime::new(config, log.clone()),
        plugin,
        log,
        output,
    }
}

fn audio_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn test_action_delivers_stubbed_audio() {
    let h = harness(|c| c).await;
    let audio = audio_bytes(2048);
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .and(query_param("text", "你好，世界"))
        .and(query_param("id", "3"))
        .and(query_param("lang", "zh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(audio.clone())
                .insert_header("content-type", "audio/wav"),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "你好，世界", "voice_id": "3"}))
        .await;

    assert!(outcome.success, "{}", outcome.message);
    let sent = h.runtime.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Custom(kind, _) if kind == "voiceurl"));

    let paths = h.runtime.voice_paths();
    assert!(paths[0].starts_with(h.output.path()));
    assert_eq!(std::fs::read(&paths[0]).unwrap(), audio);
    assert!(h.log.contains(LogLevel::Info, "Received audio data: 2048 bytes"));
}

#[tokio::test]
async fn test_command_delivers_through_typed_send() {
    let h = harness(|c| c.with_language("ja")).await;
    let audio = audio_bytes(512);
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .and(query_param("text", "こんにちは"))
        .and(query_param("id", "2"))
        .and(query_param("lang", "ja"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio.clone()))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .plugin
        .command()
        .handle_message(&h.runtime, "/vits こんにちは 2")
        .await
        .expect("message is a /vits command");

    assert!(outcome.success, "{}", outcome.message);
    let sent = h.runtime.sent();
    assert_eq!(sent.len(), 1);
    assert!(matches!(&sent[0], Sent::Typed(kind, _) if kind == "voiceurl"));
    assert_eq!(std::fs::read(&h.runtime.voice_paths()[0]).unwrap(), audio);
}

#[tokio::test]
async fn test_text_over_limit_makes_no_request() {
    let h = harness(|c| c.with_max_text_length(5)).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_bytes(200)))
        .expect(0)
        .mount(&h.server)
        .await;

    let action_outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "abcdef"}))
        .await;
    let command_outcome = h
        .plugin
        .command()
        .handle_message(&h.runtime, "/vits abcdef")
        .await
        .unwrap();

    for outcome in [action_outcome, command_outcome] {
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Text too long: 6/5");
    }
    let texts = h.runtime.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts.iter().all(|t| t.contains("limit 5")));
    assert!(h.runtime.voice_paths().is_empty());
}

#[tokio::test]
async fn test_blank_text_makes_no_request() {
    let h = harness(|c| c).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_bytes(200)))
        .expect(0)
        .mount(&h.server)
        .await;

    let outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "   "}))
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Missing text");
    assert_eq!(h.runtime.texts().len(), 1);
    assert!(h.runtime.voice_paths().is_empty());
}

#[tokio::test]
async fn test_omitted_voice_uses_default() {
    let h = harness(|c| c.with_default_voice_id("7")).await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .and(query_param("id", "7"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_bytes(300)))
        .expect(2)
        .mount(&h.server)
        .await;

    let action_outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "hello", "voice_id": ""}))
        .await;
    let command_outcome = h
        .plugin
        .command()
        .handle_message(&h.runtime, "/vits hello world")
        .await
        .unwrap();

    assert!(action_outcome.success);
    assert!(command_outcome.success);
}

#[tokio::test]
async fn test_undersized_body_is_rejected() {
    let h = harness(|c| c).await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_bytes(50)))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "hello"}))
        .await;

    assert!(!outcome.success);
    assert!(h.runtime.voice_paths().is_empty());
    assert_eq!(h.runtime.texts(), vec![SYNTHESIS_FAILED_REPLY.to_string()]);
    assert!(h.log.contains(LogLevel::Error, "50 bytes"));
    assert_eq!(std::fs::read_dir(h.output.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_server_error_body_is_logged_not_shown() {
    let h = harness(|c| c).await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .plugin
        .command()
        .handle_message(&h.runtime, "/vits hello")
        .await
        .unwrap();

    assert!(!outcome.success);
    assert!(h.log.contains(LogLevel::Error, "500 - model exploded"));
    let texts = h.runtime.texts();
    assert_eq!(texts.len(), 1);
    assert!(!texts[0].contains("model exploded"));
    assert!(!outcome.message.contains("model exploded"));
}

#[tokio::test]
async fn test_unresponsive_server_times_out_promptly() {
    let h = harness(|c| c.with_timeout(1)).await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(audio_bytes(500))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&h.server)
        .await;

    let started = Instant::now();
    let outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "hello"}))
        .await;

    assert!(!outcome.success);
    assert!(started.elapsed() < Duration::from_secs(4));
    assert!(h.runtime.voice_paths().is_empty());
    assert_eq!(h.runtime.texts(), vec![SYNTHESIS_FAILED_REPLY.to_string()]);
}

#[tokio::test]
async fn test_retries_recover_from_server_errors() {
    let h = harness(|c| c.with_retry_count(2)).await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_bytes(256)))
        .expect(1)
        .mount(&h.server)
        .await;

    let plugin = h.plugin.with_retries();
    let outcome = plugin
        .action()
        .handler(&h.runtime, &json!({"text": "hello"}))
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(h.runtime.voice_paths().len(), 1);
}

#[tokio::test]
async fn test_without_retries_a_single_attempt_is_made() {
    let h = harness(|c| c.with_retry_count(2)).await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&h.server)
        .await;

    let outcome = h
        .plugin
        .action()
        .handler(&h.runtime, &json!({"text": "hello"}))
        .await;

    assert!(!outcome.success);
}

#[tokio::test]
async fn test_plugin_config_applies_when_runtime_has_no_settings() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .and(query_param("id", "4"))
        .and(query_param("lang", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio_bytes(300)))
        .expect(1)
        .mount(&server)
        .await;

    let config = VitsConfig::default()
        .with_api_url(format!("{}{}", server.uri(), VOICE_PATH))
        .with_default_voice_id("4")
        .with_language("en");
    let output = tempfile::tempdir().unwrap();
    let client = VitsClient::new().unwrap().with_output_dir(output.path());
    let plugin = create_plugin(config)
        .unwrap()
        .with_synthesizer(Arc::new(client));
    let runtime = TestRuntime::without_settings(Arc::new(MemoryLogSink::new()));

    let outcome = plugin
        .action()
        .handler(&runtime, &json!({"text": "hello"}))
        .await;

    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(runtime.voice_paths().len(), 1);
}

#[tokio::test]
async fn test_default_client_logs_to_runtime_sink() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let config = VitsConfig::default().with_api_url(format!("{}{}", server.uri(), VOICE_PATH));
    let plugin = create_plugin(config.clone()).unwrap();
    let log = Arc::new(MemoryLogSink::new());
    let runtime = TestRuntime::new(config, log.clone());

    let outcome = plugin
        .action()
        .handler(&runtime, &json!({"text": "hello"}))
        .await;

    assert!(!outcome.success);
    assert!(log.contains(LogLevel::Error, "500 - model exploded"));
}

#[tokio::test]
async fn test_concurrent_requests_write_separate_files() {
    let h = harness(|c| c).await;
    let first = vec![1u8; 300];
    let second = vec![2u8; 400];
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .and(query_param("text", "one"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(first.clone())
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path(VOICE_PATH))
        .and(query_param("text", "two"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(second.clone()))
        .expect(1)
        .mount(&h.server)
        .await;

    let action = h.plugin.action();
    let msg_one = json!({"text": "one"});
    let msg_two = json!({"text": "two"});
    let (one, two) = tokio::join!(
        action.handler(&h.runtime, &msg_one),
        action.handler(&h.runtime, &msg_two),
    );

    assert!(one.success, "{}", one.message);
    assert!(two.success, "{}", two.message);
    let paths = h.runtime.voice_paths();
    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);

    let mut contents: Vec<Vec<u8>> = paths.iter().map(|p| std::fs::read(p).unwrap()).collect();
    contents.sort();
    assert_eq!(contents, vec![first, second]);
}

#[tokio::test]
async fn test_component_switches_from_toml() {
    let config = VitsConfig::from_toml_str(
        r#"
        [components]
        action_enabled = false
        "#,
    )
    .unwrap();
    let plugin = create_plugin(config).unwrap();

    let names: Vec<String> = plugin
        .components()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["vits_tts_command"]);
    assert!(plugin.action().validate("用语音说你好"));
    assert!(plugin.command().matches("/vits 你好"));
}
