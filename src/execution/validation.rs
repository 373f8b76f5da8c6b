//! Post-step validation.
//!
//! Plan steps name validations in prose ("Run tests", "Build project");
//! each name maps to configured commands, an operator check or a no-op.
//! Unknown names run as shell commands.

use std::path::Path;
use std::time::Duration;

use super::operator::Operator;
use crate::config::ValidationConfig;
use crate::process::CommandRunner;

pub struct Validator<'a> {
    root: &'a Path,
    runner: &'a dyn CommandRunner,
    config: &'a ValidationConfig,
    /// `None` means operator checks are assumed to pass
    operator: Option<&'a dyn Operator>,
}

impl<'a> Validator<'a> {
    pub fn new(root: &'a Path, runner: &'a dyn CommandRunner, config: &'a ValidationConfig) -> Self {
        Self {
            root,
            runner,
            config,
            operator: None,
        }
    }

    pub fn with_operator(mut self, operator: &'a dyn Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    /// Run every named validation, stopping at the first failure.
    pub fn run_all(&self, names: &[String]) -> Result<(), String> {
        for name in names {
            self.run(name)
                .map_err(|e| format!("Validation failed: {name}: {e}"))?;
        }
        Ok(())
    }

    pub fn run(&self, name: &str) -> Result<(), String> {
        match name.trim() {
            "Run tests" => self.run_commands(&self.config.test_commands),
            "Build project" => self.run_commands(&self.config.build_commands),
            "Manual inspection" => self.inspect(),
            "Dependency verification" => self.verify_dependencies(),
            "Comprehensive testing" => {
                self.run_commands(&self.config.test_commands)?;
                self.run_commands(&self.config.build_commands)
            }
            "Performance verification" => Ok(()),
            "" => Ok(()),
            command => self.run_command(command),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.max_validation_time)
    }

    fn run_commands(&self, commands: &[String]) -> Result<(), String> {
        commands.iter().try_for_each(|c| self.run_command(c))
    }

    fn run_command(&self, command: &str) -> Result<(), String> {
        log::info!("Validating with `{}`", command);
        let output = self
            .runner
            .run_shell(command, self.root, Some(self.timeout()))
            .map_err(|e| format!("could not start `{command}`: {e}"))?;
        if output.success() {
            Ok(())
        } else {
            Err(format!("`{command}` {}", output.failure_message()))
        }
    }

    fn inspect(&self) -> Result<(), String> {
        match self.operator {
            Some(operator) if !operator.confirm("Does the removal look correct?") => {
                Err("rejected during manual inspection".to_string())
            }
            Some(_) => Ok(()),
            None => {
                log::info!("Manual inspection assumed outside manual review");
                Ok(())
            }
        }
    }

    fn verify_dependencies(&self) -> Result<(), String> {
        if self.root.join("package.json").is_file() {
            self.run_command("npm ls --depth=0")
        } else {
            Ok(())
        }
    }
}
