#![allow(missing_docs)]
//! Keyword-activated actions.

mod vits_tts;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::runtime::PluginRuntime;
use crate::types::{ActionInfo, ExecutionOutcome};

pub use vits_tts::{VitsTtsAction, ACTIVATION_KEYWORDS};

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;
    fn similes(&self) -> Vec<&'static str>;
    fn description(&self) -> &'static str;
    fn info(&self) -> ActionInfo;
    fn validate(&self, message_text: &str) -> bool;
    async fn handler(&self, runtime: &dyn PluginRuntime, params: &JsonValue) -> ExecutionOutcome;
}
