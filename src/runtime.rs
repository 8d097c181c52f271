//! Host capability interface.
//!
//! This trait is the whole contract between the plugin and the chat-bot host:
//! configuration lookup, the reply primitives and the logging sink. Config
//! accessors always return a value, falling back to the caller's default.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::logging::{LogSink, TracingLogSink};

/// Capabilities the host hands to each invocation.
#[async_trait]
pub trait PluginRuntime: Send + Sync {
    /// Raw configuration value for a dotted key, e.g. `vits.api_url`.
    fn get_config(&self, key: &str) -> Option<JsonValue>;

    /// Send a plain-text reply to the current chat.
    async fn send_text(&self, text: &str) -> anyhow::Result<()>;

    /// Send a custom-typed message (action path).
    async fn send_custom(&self, message_type: &str, content: &str) -> anyhow::Result<()>;

    /// Send a typed message (command path).
    async fn send_type(&self, message_type: &str, content: &str) -> anyhow::Result<()>;

    /// Logging sink for this invocation.
    fn log_sink(&self) -> Arc<dyn LogSink> {
        Arc::new(TracingLogSink)
    }

    /// Prefix for log lines, typically identifying the chat stream.
    fn log_prefix(&self) -> String {
        String::new()
    }

    /// String setting or `default`. Numbers and booleans are stringified.
    fn config_string(&self, key: &str, default: &str) -> String {
        match self.get_config(key) {
            Some(JsonValue::String(s)) => s,
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(JsonValue::Bool(b)) => b.to_string(),
            _ => default.to_string(),
        }
    }

    /// Unsigned integer setting or `default`. Numeric strings are accepted.
    fn config_u64(&self, key: &str, default: u64) -> u64 {
        match self.get_config(key) {
            Some(JsonValue::Number(n)) => n.as_u64().unwrap_or(default),
            Some(JsonValue::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Boolean setting or `default`.
    fn config_bool(&self, key: &str, default: bool) -> bool {
        match self.get_config(key) {
            Some(JsonValue::Bool(b)) => b,
            Some(JsonValue::String(s)) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => default,
            },
            _ => default,
        }
    }
}
