//! Non-interactive UI for CI/headless environments.

use std::collections::HashMap;

use crate::error::{InitError, Result};

use super::theme::InitTheme;
use super::{
    parse_bool, OutputMode, Prompt, PromptResult, PromptType, SpinnerHandle, UserInterface,
};

/// Environment prefix for scripted answers (`PIPELINE_INIT_ANSWER_<KEY>`).
pub const ANSWER_ENV_PREFIX: &str = "PIPELINE_INIT_ANSWER_";

/// UI implementation for non-interactive mode.
///
/// Prompts are answered from, in order: explicit answers (`--answer`),
/// `PIPELINE_INIT_ANSWER_<KEY>` environment variables, and the prompt's
/// default. A prompt with none of these fails with
/// [`InitError::PromptUnavailable`].
pub struct NonInteractiveUI {
    mode: OutputMode,
    answers: HashMap<String, String>,
    env_overrides: HashMap<String, String>,
    theme: InitTheme,
}

impl NonInteractiveUI {
    /// Create a new non-interactive UI reading overrides from the environment.
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides: HashMap<String, String> = std::env::vars()
            .filter(|(k, _)| k.starts_with(ANSWER_ENV_PREFIX))
            .collect();

        Self::with_overrides(mode, env_overrides)
    }

    /// Create with explicit environment-style overrides (for testing).
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            answers: HashMap::new(),
            env_overrides: overrides,
            theme: InitTheme::plain(),
        }
    }

    /// Add answers keyed by prompt key. Keys match case-insensitively.
    pub fn with_answers<I, K, V>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in answers {
            self.answers
                .insert(key.as_ref().to_uppercase(), value.into());
        }
        self
    }

    fn lookup(&self, key: &str) -> Option<&String> {
        let key = key.to_uppercase();
        self.answers
            .get(&key)
            .or_else(|| self.env_overrides.get(&format!("{}{}", ANSWER_ENV_PREFIX, key)))
    }
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_warning(msg));
    }

    fn error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        let value = self
            .lookup(&prompt.key)
            .or(prompt.default.as_ref())
            .cloned()
            .ok_or_else(|| InitError::PromptUnavailable {
                key: prompt.key.clone(),
            })?;

        tracing::debug!(key = %prompt.key, value = %value, "Answered without prompting");

        match prompt.prompt_type {
            PromptType::Confirm => parse_bool(&value)
                .map(PromptResult::Bool)
                .ok_or_else(|| InitError::PromptUnavailable {
                    key: prompt.key.clone(),
                }),
            PromptType::Input | PromptType::Select { .. } => Ok(PromptResult::String(value)),
        }
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_status() {
            println!("  {}", message);
        }
        Box::new(NoopSpinner {
            theme: self.theme.clone(),
            mode: self.mode,
        })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("\n{}\n", title);
        }
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Spinner that prints only its final status.
struct NoopSpinner {
    theme: InitTheme,
    mode: OutputMode,
}

impl SpinnerHandle for NoopSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", self.theme.format_success(msg));
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("{}", self.theme.format_error(msg));
    }
}
