//! Operator confirmations for `manual_review` runs.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Answers yes/no questions during execution.
pub trait Operator {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Asks on the terminal. Anything but an explicit yes declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn confirm(&self, prompt: &str) -> bool {
        match Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                log::warn!("Could not read operator answer: {}", e);
                false
            }
        }
    }
}

/// Approves everything; used with `--yes` and `--no-confirmation`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Operator for AutoApprove {
    fn confirm(&self, prompt: &str) -> bool {
        log::debug!("Auto-approved: {}", prompt);
        true
    }
}

/// Replays a fixed list of answers, then falls back to `default`.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    answers: RefCell<VecDeque<bool>>,
    default: bool,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(answers: impl IntoIterator<Item = bool>, default: bool) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            default,
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Prompts seen so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Operator for ScriptedOperator {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answers.borrow_mut().pop_front().unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_operator_replays_then_defaults() {
        let operator = ScriptedOperator::new([true, false], false);
        assert!(operator.confirm("first"));
        assert!(!operator.confirm("second"));
        assert!(!operator.confirm("third"));
        assert_eq!(operator.prompts(), vec!["first", "second", "third"]);
    }
}
