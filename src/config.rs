//! Configuration for the VITS plugin.
//!
//! Settings live in three sections (`plugin`, `components`, `vits`) and are read
//! once per plugin load. They can come from a `config.toml`, from environment
//! variables, or from the host through [`PluginRuntime`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{Result, VitsError};
use crate::runtime::PluginRuntime;
use crate::types::{
    DEFAULT_API_URL, DEFAULT_AUDIO_FORMAT, DEFAULT_LANGUAGE, DEFAULT_MAX_TEXT_LENGTH,
    DEFAULT_RETRY_COUNT, DEFAULT_TIMEOUT_SECS, DEFAULT_VOICE_ID,
};

/// Name of the plugin config file.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Section name to human description.
pub const CONFIG_SECTION_DESCRIPTIONS: &[(&str, &str)] = &[
    ("plugin", "Basic plugin settings"),
    ("components", "Component enable switches"),
    ("vits", "VITS API settings"),
];

/// `[plugin]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSection {
    /// Whether the plugin is enabled.
    pub enabled: bool,
}

impl Default for PluginSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[components]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentsSection {
    /// Register the keyword action.
    pub action_enabled: bool,
    /// Register the `/vits` command.
    pub command_enabled: bool,
}

impl Default for ComponentsSection {
    fn default() -> Self {
        Self {
            action_enabled: true,
            command_enabled: true,
        }
    }
}

/// `[vits]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitsSection {
    /// API endpoint.
    pub api_url: String,
    /// Voice id used when none is given.
    pub default_voice_id: String,
    /// Language code (zh/en/ja...).
    pub language: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Maximum text length in characters.
    pub max_text_length: usize,
    /// Retry count for the retry decorator.
    pub retry_count: u32,
    /// Audio format; used as the file extension, never checked against the bytes.
    pub audio_format: String,
}

impl Default for VitsSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_voice_id: DEFAULT_VOICE_ID.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            retry_count: DEFAULT_RETRY_COUNT,
            audio_format: DEFAULT_AUDIO_FORMAT.to_string(),
        }
    }
}

/// Full plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitsConfig {
    /// `[plugin]`
    pub plugin: PluginSection,
    /// `[components]`
    pub components: ComponentsSection,
    /// `[vits]`
    pub vits: VitsSection,
}

impl VitsConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - VITS_PLUGIN_ENABLED
    /// - VITS_ACTION_ENABLED, VITS_COMMAND_ENABLED
    /// - VITS_API_URL, VITS_DEFAULT_VOICE_ID, VITS_LANGUAGE
    /// - VITS_TIMEOUT, VITS_MAX_TEXT_LENGTH, VITS_RETRY_COUNT, VITS_AUDIO_FORMAT
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            plugin: PluginSection {
                enabled: env_bool("VITS_PLUGIN_ENABLED").unwrap_or(defaults.plugin.enabled),
            },
            components: ComponentsSection {
                action_enabled: env_bool("VITS_ACTION_ENABLED")
                    .unwrap_or(defaults.components.action_enabled),
                command_enabled: env_bool("VITS_COMMAND_ENABLED")
                    .unwrap_or(defaults.components.command_enabled),
            },
            vits: VitsSection {
                api_url: std::env::var("VITS_API_URL").unwrap_or(defaults.vits.api_url),
                default_voice_id: std::env::var("VITS_DEFAULT_VOICE_ID")
                    .unwrap_or(defaults.vits.default_voice_id),
                language: std::env::var("VITS_LANGUAGE").unwrap_or(defaults.vits.language),
                timeout: env_parse("VITS_TIMEOUT").unwrap_or(defaults.vits.timeout),
                max_text_length: env_parse("VITS_MAX_TEXT_LENGTH")
                    .unwrap_or(defaults.vits.max_text_length),
                retry_count: env_parse("VITS_RETRY_COUNT").unwrap_or(defaults.vits.retry_count),
                audio_format: std::env::var("VITS_AUDIO_FORMAT")
                    .unwrap_or(defaults.vits.audio_format),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolve every setting through the host, falling back to `base` per key.
    ///
    /// Integers that do not fit the target type fall back as well. The result is
    /// not validated; see [`VitsConfig::validate`].
    pub fn from_runtime(runtime: &dyn PluginRuntime, base: &VitsConfig) -> Self {
        let b = base;
        Self {
            plugin: PluginSection {
                enabled: runtime.config_bool("plugin.enabled", b.plugin.enabled),
            },
            components: ComponentsSection {
                action_enabled: runtime
                    .config_bool("components.action_enabled", b.components.action_enabled),
                command_enabled: runtime
                    .config_bool("components.command_enabled", b.components.command_enabled),
            },
            vits: VitsSection {
                api_url: runtime.config_string("vits.api_url", &b.vits.api_url),
                default_voice_id: runtime
                    .config_string("vits.default_voice_id", &b.vits.default_voice_id),
                language: runtime.config_string("vits.language", &b.vits.language),
                timeout: runtime.config_u64("vits.timeout", b.vits.timeout),
                max_text_length: usize::try_from(
                    runtime.config_u64("vits.max_text_length", b.vits.max_text_length as u64),
                )
                .unwrap_or(b.vits.max_text_length),
                retry_count: u32::try_from(
                    runtime.config_u64("vits.retry_count", u64::from(b.vits.retry_count)),
                )
                .unwrap_or(b.vits.retry_count),
                audio_format: runtime.config_string("vits.audio_format", &b.vits.audio_format),
            },
        }
    }

    /// Reject settings the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.vits.api_url.trim().is_empty() {
            return Err(VitsError::config("vits.api_url must not be empty"));
        }
        if self.vits.timeout == 0 {
            return Err(VitsError::config("vits.timeout must be at least 1 second"));
        }
        if self.vits.max_text_length == 0 {
            return Err(VitsError::config("vits.max_text_length must be positive"));
        }
        Ok(())
    }

    /// Look up a value by dotted key, e.g. `vits.timeout`.
    pub fn get(&self, key: &str) -> Option<JsonValue> {
        let mut current = serde_json::to_value(self).ok()?;
        for part in key.split('.') {
            current = current.get_mut(part)?.take();
        }
        Some(current)
    }

    /// Render as TOML, e.g. to write a default `config.toml`.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VitsError::config(e.to_string()))
    }

    /// Set the API URL.
    pub fn with_api_url<S: Into<String>>(mut self, api_url: S) -> Self {
        self.vits.api_url = api_url.into();
        self
    }

    /// Set the default voice id.
    pub fn with_default_voice_id<S: Into<String>>(mut self, voice_id: S) -> Self {
        self.vits.default_voice_id = voice_id.into();
        self
    }

    /// Set the language.
    pub fn with_language<S: Into<String>>(mut self, language: S) -> Self {
        self.vits.language = language.into();
        self
    }

    /// Set the timeout in seconds.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.vits.timeout = seconds;
        self
    }

    /// Set the maximum text length.
    pub fn with_max_text_length(mut self, max: usize) -> Self {
        self.vits.max_text_length = max;
        self
    }

    /// Set the retry count.
    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.vits.retry_count = retries;
        self
    }

    /// Set the audio format.
    pub fn with_audio_format<S: Into<String>>(mut self, format: S) -> Self {
        self.vits.audio_format = format.into();
        self
    }

    /// Enable or disable the components.
    pub fn with_components(mut self, action_enabled: bool, command_enabled: bool) -> Self {
        self.components = ComponentsSection {
            action_enabled,
            command_enabled,
        };
        self
    }
}

fn env_bool(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigValueType {
    /// `true` / `false`
    Bool,
    /// Integer
    Int,
    /// String
    Str,
}

/// One entry of the configuration schema shown to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    /// Section name.
    pub section: String,
    /// Key inside the section.
    pub name: String,
    /// Value type.
    pub value_type: ConfigValueType,
    /// Default value.
    pub default: JsonValue,
    /// Description.
    pub description: String,
}

impl ConfigField {
    fn new(
        section: &str,
        name: &str,
        value_type: ConfigValueType,
        default: impl Into<JsonValue>,
        description: &str,
    ) -> Self {
        Self {
            section: section.to_string(),
            name: name.to_string(),
            value_type,
            default: default.into(),
            description: description.to_string(),
        }
    }

    /// Dotted key, e.g. `vits.timeout`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.section, self.name)
    }
}

/// The configuration schema, in file order.
pub fn config_schema() -> Vec<ConfigField> {
    use ConfigValueType::{Bool, Int, Str};

    vec![
        ConfigField::new("plugin", "enabled", Bool, true, "Whether the plugin is enabled"),
        ConfigField::new(
            "components",
            "action_enabled",
            Bool,
            true,
            "Whether the keyword action is enabled",
        ),
        ConfigField::new(
            "components",
            "command_enabled",
            Bool,
            true,
            "Whether the /vits command is enabled",
        ),
        ConfigField::new("vits", "api_url", Str, DEFAULT_API_URL, "VITS API endpoint"),
        ConfigField::new("vits", "default_voice_id", Str, DEFAULT_VOICE_ID, "Default voice id"),
        ConfigField::new("vits", "language", Str, DEFAULT_LANGUAGE, "Default language (zh/en/ja...)"),
        ConfigField::new(
            "vits",
            "timeout",
            Int,
            DEFAULT_TIMEOUT_SECS,
            "API request timeout in seconds",
        ),
        ConfigField::new(
            "vits",
            "max_text_length",
            Int,
            DEFAULT_MAX_TEXT_LENGTH as u64,
            "Maximum text length",
        ),
        ConfigField::new(
            "vits",
            "retry_count",
            Int,
            DEFAULT_RETRY_COUNT,
            "Retries after a failed API call",
        ),
        ConfigField::new("vits", "audio_format", Str, DEFAULT_AUDIO_FORMAT, "Audio file format"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_config_default() {
        let config = VitsConfig::default();
        assert!(config.plugin.enabled);
        assert!(config.components.action_enabled);
        assert!(config.components.command_enabled);
        assert_eq!(config.vits.api_url, DEFAULT_API_URL);
        assert_eq!(config.vits.default_voice_id, "0");
        assert_eq!(config.vits.language, "zh");
        assert_eq!(config.vits.timeout, 30);
        assert_eq!(config.vits.max_text_length, 500);
        assert_eq!(config.vits.retry_count, 2);
        assert_eq!(config.vits.audio_format, "wav");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = VitsConfig::from_toml_str(
            r#"
            [components]
            command_enabled = false

            [vits]
            language = "ja"
            timeout = 10
            "#,
        )
        .unwrap();

        assert!(config.components.action_enabled);
        assert!(!config.components.command_enabled);
        assert_eq!(config.vits.language, "ja");
        assert_eq!(config.vits.timeout, 10);
        assert_eq!(config.vits.default_voice_id, "0");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = VitsConfig::from_toml_str("[vits]\ntimeout = \"soon\"").unwrap_err();
        assert!(matches!(err, VitsError::Config(_)));

        let err = VitsConfig::from_toml_str("[vits]\ntimeout = 0").unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = VitsConfig::new().with_language("en").with_retry_count(0);
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("[vits]"));
        assert_eq!(VitsConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[vits]\ndefault_voice_id = \"7\"\n").unwrap();

        let config = VitsConfig::from_file(&path).unwrap();
        assert_eq!(config.vits.default_voice_id, "7");
    }

    #[test]
    fn test_dotted_lookup() {
        let config = VitsConfig::new().with_timeout(12);
        assert_eq!(config.get("vits.timeout"), Some(JsonValue::from(12)));
        assert_eq!(config.get("plugin.enabled"), Some(JsonValue::Bool(true)));
        assert_eq!(config.get("vits.nope"), None);
        assert_eq!(config.get("nope"), None);
    }

    #[test]
    fn test_schema_matches_defaults() {
        let config = VitsConfig::default();
        let schema = config_schema();
        assert_eq!(schema.len(), 10);
        for field in schema {
            assert_eq!(config.get(&field.key()), Some(field.default.clone()), "{}", field.key());
        }
    }

    struct HostSettings(Vec<(&'static str, JsonValue)>);

    #[async_trait::async_trait]
    impl PluginRuntime for HostSettings {
        fn get_config(&self, key: &str) -> Option<JsonValue> {
            self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())
        }

        async fn send_text(&self, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn send_custom(&self, _message_type: &str, _content: &str) -> anyhow::Result<()> {
            Ok(())
        }

        async fn send_type(&self, _message_type: &str, _content: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_runtime_without_values_keeps_loaded_config() {
        let base = VitsConfig::new()
            .with_api_url("http://tts.local/voice/vits")
            .with_language("ja")
            .with_timeout(9)
            .with_max_text_length(42)
            .with_default_voice_id("3");

        let resolved = VitsConfig::from_runtime(&HostSettings(Vec::new()), &base);

        assert_eq!(resolved, base);
    }

    #[test]
    fn test_runtime_values_override_loaded_config() {
        let base = VitsConfig::new().with_language("ja").with_timeout(9);
        let host = HostSettings(vec![
            ("vits.language", JsonValue::from("en")),
            ("components.command_enabled", JsonValue::from(false)),
        ]);

        let resolved = VitsConfig::from_runtime(&host, &base);

        assert_eq!(resolved.vits.language, "en");
        assert_eq!(resolved.vits.timeout, 9);
        assert!(!resolved.components.command_enabled);
    }

    #[test]
    fn test_out_of_range_integers_fall_back() {
        let base = VitsConfig::new().with_retry_count(4);
        let host = HostSettings(vec![("vits.retry_count", JsonValue::from(u64::MAX))]);

        let resolved = VitsConfig::from_runtime(&host, &base);

        assert_eq!(resolved.vits.retry_count, 4);
    }

    #[test]
    fn test_section_descriptions_cover_schema() {
        for field in config_schema() {
            assert!(CONFIG_SECTION_DESCRIPTIONS
                .iter()
                .any(|(section, _)| *section == field.section));
        }
    }
}
