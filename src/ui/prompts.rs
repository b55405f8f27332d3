//! Interactive prompts.

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};

use crate::error::{InitError, Result};

use super::{parse_bool, Prompt, PromptOption, PromptResult, PromptType};

fn map_dialoguer_err(e: dialoguer::Error) -> InitError {
    InitError::Io(e.into())
}

/// Dialoguer theme without the default yellow `?` prefix.
fn prompt_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("".to_string()),
        ..ColorfulTheme::default()
    }
}

/// Prompt the user for input.
pub fn prompt_user(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    match &prompt.prompt_type {
        PromptType::Confirm => prompt_confirm(prompt, term),
        PromptType::Input => prompt_input(prompt, term),
        PromptType::Select { options } => prompt_select(prompt, options, term),
    }
}

fn prompt_confirm(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let default = prompt
        .default
        .as_deref()
        .and_then(parse_bool)
        .unwrap_or(true);

    let result = Confirm::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .default(default)
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    Ok(PromptResult::Bool(result))
}

fn prompt_input(prompt: &Prompt, term: &Term) -> Result<PromptResult> {
    let theme = prompt_theme();
    let input = Input::<String>::with_theme(&theme).with_prompt(&prompt.question);

    let result: String = if let Some(default) = &prompt.default {
        input
            .default(default.clone())
            .interact_on(term)
            .map_err(map_dialoguer_err)?
    } else {
        input.interact_on(term).map_err(map_dialoguer_err)?
    };

    Ok(PromptResult::String(result.trim().to_string()))
}

fn prompt_select(prompt: &Prompt, options: &[PromptOption], term: &Term) -> Result<PromptResult> {
    let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();

    let selection = Select::with_theme(&prompt_theme())
        .with_prompt(&prompt.question)
        .items(&labels)
        .default(default_index(prompt, options))
        .interact_on(term)
        .map_err(map_dialoguer_err)?;

    let chosen = options.get(selection).ok_or_else(|| InitError::PromptUnavailable {
        key: prompt.key.clone(),
    })?;
    Ok(PromptResult::String(chosen.value.clone()))
}

/// Index of the option matching the prompt default, or the first option.
fn default_index(prompt: &Prompt, options: &[PromptOption]) -> usize {
    prompt
        .default
        .as_ref()
        .and_then(|d| options.iter().position(|o| o.value == *d))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(value: &str) -> PromptOption {
        PromptOption {
            label: value.to_string(),
            value: value.to_string(),
        }
    }

    fn make_prompt(key: &str, prompt_type: PromptType, default: Option<&str>) -> Prompt {
        Prompt {
            key: key.to_string(),
            question: "Select: Gradle task".to_string(),
            prompt_type,
            default: default.map(String::from),
        }
    }

    #[test]
    fn default_index_follows_prompt_default() {
        let options = vec![option("assemble"), option("assembleDebug"), option("assembleRelease")];
        let prompt = make_prompt(
            "GRADLE_TASK",
            PromptType::Select {
                options: options.clone(),
            },
            Some("assembleRelease"),
        );
        assert_eq!(default_index(&prompt, &options), 2);
    }

    #[test]
    fn default_index_falls_back_to_first() {
        let options = vec![option("assemble"), option("assembleDebug")];
        let unknown = make_prompt("GRADLE_TASK", PromptType::Input, Some("lint"));
        let none = make_prompt("GRADLE_TASK", PromptType::Input, None);

        assert_eq!(default_index(&unknown, &options), 0);
        assert_eq!(default_index(&none, &options), 0);
    }
}
