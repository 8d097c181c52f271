#![allow(missing_docs)]
//! Slash commands.

mod vits;

use async_trait::async_trait;

use crate::runtime::PluginRuntime;
use crate::types::{CommandInfo, ExecutionOutcome};

pub use vits::{CommandMatch, VitsTtsCommand, COMMAND_PATTERN};

#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &'static str;
    fn info(&self) -> CommandInfo;
    fn matches(&self, message: &str) -> bool;
    /// Run against a raw chat message. `None` when the message is not this command.
    async fn handle_message(
        &self,
        runtime: &dyn PluginRuntime,
        message: &str,
    ) -> Option<ExecutionOutcome>;
}
