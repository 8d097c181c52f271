#![allow(missing_docs)]

use std::sync::Arc;

use crate::actions::{Action, VitsTtsAction};
use crate::client::{Synthesizer, VitsClient};
use crate::commands::{Command, VitsTtsCommand};
use crate::config::{
    config_schema, ConfigField, VitsConfig, CONFIG_FILE_NAME, CONFIG_SECTION_DESCRIPTIONS,
};
use crate::error::Result;
use crate::retry::RetryingSynthesizer;
use crate::types::ComponentInfo;
use crate::{PLUGIN_DESCRIPTION, PLUGIN_NAME, PLUGIN_VERSION};

pub const PLUGIN_AUTHOR: &str = "Augment Agent";

pub struct VitsTtsPlugin {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub author: &'static str,
    config: Arc<VitsConfig>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl VitsTtsPlugin {
    pub fn new(config: VitsConfig) -> Result<Self> {
        config.validate()?;
        let client = VitsClient::new()?.with_audio_format(config.vits.audio_format.clone());

        Ok(Self {
            name: PLUGIN_NAME,
            description: PLUGIN_DESCRIPTION,
            version: PLUGIN_VERSION,
            author: PLUGIN_AUTHOR,
            config: Arc::new(config),
            synthesizer: Arc::new(client),
        })
    }

    /// Replace the synthesizer shared by the action and the command.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Retry transport and server failures up to `vits.retry_count` times.
    pub fn with_retries(mut self) -> Self {
        let retrying = RetryingSynthesizer::new(self.synthesizer, self.config.vits.retry_count);
        self.synthesizer = Arc::new(retrying);
        self
    }

    pub fn config(&self) -> &VitsConfig {
        &self.config
    }

    pub fn enabled(&self) -> bool {
        self.config.plugin.enabled
    }

    pub fn config_file_name(&self) -> &'static str {
        CONFIG_FILE_NAME
    }

    pub fn config_section_descriptions(&self) -> &'static [(&'static str, &'static str)] {
        CONFIG_SECTION_DESCRIPTIONS
    }

    pub fn config_schema(&self) -> Vec<ConfigField> {
        config_schema()
    }

    /// Other plugins this one needs. None.
    pub fn dependencies(&self) -> Vec<&'static str> {
        Vec::new()
    }

    pub fn action(&self) -> VitsTtsAction {
        VitsTtsAction::new(self.synthesizer.clone(), self.config.clone())
    }

    pub fn command(&self) -> VitsTtsCommand {
        VitsTtsCommand::new(self.synthesizer.clone(), self.config.clone())
    }

    /// Components to register. Empty when the plugin is disabled.
    pub fn components(&self) -> Vec<ComponentInfo> {
        let mut components = Vec::new();
        if !self.enabled() {
            return components;
        }
        if self.config.components.action_enabled {
            components.push(ComponentInfo::Action(self.action().info()));
        }
        if self.config.components.command_enabled {
            components.push(ComponentInfo::Command(self.command().info()));
        }
        components
    }
}

pub fn create_plugin(config: VitsConfig) -> Result<VitsTtsPlugin> {
    VitsTtsPlugin::new(config)
}

/// Plugin configured from `VITS_*` environment variables.
pub fn get_vits_plugin() -> Result<VitsTtsPlugin> {
    VitsTtsPlugin::new(VitsConfig::from_env()?)
}
