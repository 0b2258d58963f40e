//! Interactive fallback for keys no layer provides

use crate::error::ResolveError;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Source of operator answers.
///
/// `Ok(None)` means nobody can be asked, which the resolver reports as a missing key.
/// An `Err` aborts the whole run.
pub trait Prompter: Send + Sync {
    fn ask(&self, context_name: &str, key: &str) -> Result<Option<String>, ResolveError>;
}

/// Asks on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&self, context_name: &str, key: &str) -> Result<Option<String>, ResolveError> {
        use dialoguer::Input;

        let answer: String = Input::new()
            .with_prompt(format!("{} {}", context_name, key))
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ResolveError::PromptAborted {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(answer))
    }
}

/// Never asks; for non-interactive runs
#[derive(Debug, Default)]
pub struct DisabledPrompter;

impl Prompter for DisabledPrompter {
    fn ask(&self, _context_name: &str, _key: &str) -> Result<Option<String>, ResolveError> {
        Ok(None)
    }
}

/// Answers from a fixed table and remembers what it was asked
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: HashMap<String, String>,
    abort_on_unknown: bool,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers.insert(key.into(), value.into());
        self
    }

    /// Treat an unscripted key as the operator cancelling the prompt.
    pub fn abort_on_unknown(mut self) -> Self {
        self.abort_on_unknown = true;
        self
    }

    /// Keys asked so far, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, _context_name: &str, key: &str) -> Result<Option<String>, ResolveError> {
        self.asked.lock().push(key.to_string());
        match self.answers.get(key) {
            Some(answer) => Ok(Some(answer.clone())),
            None if self.abort_on_unknown => Err(ResolveError::PromptAborted {
                key: key.to_string(),
                reason: "no scripted answer".to_string(),
            }),
            None => Ok(None),
        }
    }
}
