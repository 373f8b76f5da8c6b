//! Linked tools: external collaborators a plan step may hand off to.
//!
//! The executor treats them as opaque calls with their own timeout and a
//! bounded retry budget.

use std::path::PathBuf;
use std::time::Duration;

use super::types::ExecutionStep;
use crate::config::LinkedToolConfig;
use crate::process::{shell_quote, CommandRunner};

pub trait LinkedTool {
    /// Invoke `tool` for `step`; `Ok` carries the tool's output.
    fn invoke(&self, tool: &str, step: &ExecutionStep) -> Result<String, String>;
}

/// Runs the shell template configured for a tool, if there is one.
///
/// `{path}` and `{name}` in the template are replaced by the shell-quoted
/// item path and target name.
pub struct CommandLinkedTool<'a> {
    runner: &'a dyn CommandRunner,
    root: PathBuf,
    config: &'a LinkedToolConfig,
}

impl<'a> CommandLinkedTool<'a> {
    pub fn new(runner: &'a dyn CommandRunner, root: impl Into<PathBuf>, config: &'a LinkedToolConfig) -> Self {
        Self {
            runner,
            root: root.into(),
            config,
        }
    }
}

pub fn render_template(template: &str, step: &ExecutionStep) -> String {
    template
        .replace("{path}", &shell_quote(&step.item_path))
        .replace("{name}", &shell_quote(step.target_name()))
}

impl LinkedTool for CommandLinkedTool<'_> {
    fn invoke(&self, tool: &str, step: &ExecutionStep) -> Result<String, String> {
        let Some(template) = self.config.command_for(tool) else {
            return Ok(format!("No handler configured for linked tool {tool}"));
        };
        let command = render_template(template, step);
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let output = self
            .runner
            .run_shell(&command, &self.root, Some(timeout))
            .map_err(|e| format!("could not start `{command}`: {e}"))?;
        if output.success() {
            Ok(output.stdout.trim().to_string())
        } else {
            Err(output.failure_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::RecommendedAction;
    use crate::execution::StepStatus;
    use crate::process::SystemRunner;
    use tempfile::TempDir;

    fn step() -> ExecutionStep {
        ExecutionStep {
            step_id: "step-001".into(),
            phase: 1,
            item_path: "package.json:moment".into(),
            action_type: RecommendedAction::RemoveImmediately,
            command: "npm uninstall moment".into(),
            linked_tool: Some("/skill-remove-library".into()),
            prerequisites: vec![],
            validation_steps: vec![],
            rollback_command: None,
            status: StepStatus::Pending,
            output: String::new(),
            error: String::new(),
            execution_time_seconds: 0.0,
            commit_hash: None,
        }
    }

    #[test]
    fn test_unconfigured_tool_is_recorded() {
        let temp = TempDir::new().unwrap();
        let config = LinkedToolConfig::default();
        let tool = CommandLinkedTool::new(&SystemRunner, temp.path(), &config);
        let out = tool.invoke("/skill-remove-library", &step()).unwrap();
        assert_eq!(out, "No handler configured for linked tool /skill-remove-library");
    }

    #[test]
    fn test_template_runs_with_placeholders() {
        let temp = TempDir::new().unwrap();
        let mut config = LinkedToolConfig::default();
        config
            .commands
            .insert("library_removal".into(), "echo removing {name} from {path}".into());
        let tool = CommandLinkedTool::new(&SystemRunner, temp.path(), &config);
        let out = tool.invoke("/skill-remove-library", &step()).unwrap();
        assert_eq!(out, "removing moment from package.json:moment");
    }

    #[test]
    fn test_failing_template_is_error() {
        let temp = TempDir::new().unwrap();
        let mut config = LinkedToolConfig::default();
        config.commands.insert("library_removal".into(), "exit 4".into());
        let tool = CommandLinkedTool::new(&SystemRunner, temp.path(), &config);
        let err = tool.invoke("library_removal", &step()).unwrap_err();
        assert_eq!(err, "exit code 4");
    }
}
