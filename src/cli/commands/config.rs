//! Config command implementation.
//!
//! The `pipeline-init config` command scans a repository. Interactively it
//! asks the option-tree questions and writes the selected pipeline; without
//! a terminal it writes the scan result, plus the pipeline when answers were
//! supplied up front.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::{ConfigArgs, OutputFormat};
use crate::error::{InitError, Result};
use crate::options::{PromptAnswers, ScanDump};
use crate::pipeline::{PipelineTemplate, StepCatalog};
use crate::scan::{format_warnings, ScanResult, Scanner};
use crate::ui::{NonInteractiveUI, Prompt, PromptOption, PromptType, UserInterface};

use super::dispatcher::{Command, CommandResult};

/// Prompt key of the platform question.
pub const PLATFORM_KEY: &str = "platform";

/// Prompt key of the overwrite confirmation.
pub const OVERWRITE_KEY: &str = "overwrite";

/// File stem of the written scan result.
pub const RESULT_STEM: &str = "result";

/// File stem of the written pipeline.
pub const PIPELINE_STEM: &str = "pipeline";

/// The config command implementation.
pub struct ConfigCommand {
    working_dir: PathBuf,
    args: ConfigArgs,
}

impl ConfigCommand {
    /// Create a new config command.
    pub fn new(working_dir: &Path, args: ConfigArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ConfigArgs {
        &self.args
    }

    fn scan(&self, dir: &Path, ui: &mut dyn UserInterface) -> Result<ScanResult> {
        let catalog = Arc::new(StepCatalog::builtin()?);
        let mut scanner = Scanner::new(catalog);

        let mut spinner = ui.start_spinner(&format!("Scanning {}", dir.display()));
        match scanner.scan(dir) {
            Ok(result) => {
                spinner.finish_success(&format!("Detected: {}", result.platforms().join(", ")));
                Ok(result)
            }
            Err(e) => {
                spinner.finish_error("Scan failed");
                Err(e)
            }
        }
    }

    /// Pick the platform to generate a pipeline for.
    ///
    /// `--platform` wins; a single reported platform is taken without
    /// asking; otherwise the platform question goes through `chooser`.
    fn select_platform(
        &self,
        result: &ScanResult,
        chooser: &mut dyn UserInterface,
    ) -> Result<String> {
        let platforms = result.platforms();

        let chosen = match (&self.args.platform, platforms.as_slice()) {
            (Some(platform), _) => platform.clone(),
            (None, [only]) => only.to_string(),
            (None, _) => {
                let options = platforms
                    .iter()
                    .map(|p| PromptOption {
                        label: p.to_string(),
                        value: p.to_string(),
                    })
                    .collect();
                let prompt = Prompt {
                    key: PLATFORM_KEY.to_string(),
                    question: "Select: Platform".to_string(),
                    prompt_type: PromptType::Select { options },
                    default: platforms.first().map(|p| p.to_string()),
                };
                chooser.prompt(&prompt)?.as_string()
            }
        };

        if !platforms.contains(&chosen.as_str()) {
            return Err(InitError::UnknownPlatform { name: chosen });
        }
        Ok(chosen)
    }

    fn interactive(
        &self,
        result: &ScanResult,
        output_dir: &Path,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let platform = self.select_platform(result, ui)?;
        let resolution = result.resolve(&platform, &mut PromptAnswers::new(ui))?;
        let pipeline = result.compile(&platform, &resolution)?;

        let path = document_path(output_dir, PIPELINE_STEM, self.args.format);
        if path.exists() && !confirm_overwrite(&path, ui)? {
            ui.warning(&format!("Kept existing {}", path.display()));
            return Ok(CommandResult::success());
        }

        write_document(&path, &render_pipeline(&pipeline, self.args.format)?)?;
        ui.success(&format!("Pipeline written to {}", path.display()));
        Ok(CommandResult::success())
    }

    fn non_interactive(
        &self,
        result: &ScanResult,
        output_dir: &Path,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let dump = ScanDump::from_result(result);
        let content = match self.args.format {
            OutputFormat::Yaml => dump.to_yaml()?,
            OutputFormat::Json => dump.to_json()?,
        };
        let path = document_path(output_dir, RESULT_STEM, self.args.format);
        write_document(&path, &content)?;
        ui.success(&format!("Scan result written to {}", path.display()));

        if self.args.answers.is_empty() && self.args.platform.is_none() {
            return Ok(CommandResult::success());
        }

        let mut answers =
            NonInteractiveUI::new(ui.output_mode()).with_answers(self.args.answers.iter().cloned());
        let platform = self.select_platform(result, &mut answers)?;
        let resolution = result.resolve(&platform, &mut PromptAnswers::new(&mut answers))?;
        tracing::debug!(
            platform = %platform,
            config = %resolution.config_id,
            "Resolved from answers"
        );
        let pipeline = result.compile(&platform, &resolution)?;

        let path = document_path(output_dir, PIPELINE_STEM, self.args.format);
        write_document(&path, &render_pipeline(&pipeline, self.args.format)?)?;
        ui.success(&format!("Pipeline written to {}", path.display()));
        Ok(CommandResult::success())
    }
}

impl Command for ConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let dir = self.working_dir.join(&self.args.dir);
        let output_dir = self.working_dir.join(&self.args.output_dir);

        if !dir.is_dir() {
            ui.error(&format!("Not a directory: {}", dir.display()));
            return Ok(CommandResult::failure(2));
        }

        ui.show_header("pipeline-init");
        let result = self.scan(&dir, ui)?;

        for (platform, warnings) in result.all_warnings() {
            for line in format_warnings(platform, warnings) {
                ui.warning(&line);
            }
        }

        if ui.output_mode().shows_detail() {
            for platform in result.platforms() {
                let count = result.templates(platform).map_or(0, |t| t.len());
                ui.message(&format!("  {}: {} configuration(s)", platform, count));
            }
        }

        if ui.is_interactive() && !self.args.ci {
            self.interactive(&result, &output_dir, ui)
        } else {
            self.non_interactive(&result, &output_dir, ui)
        }
    }
}

fn confirm_overwrite(path: &Path, ui: &mut dyn UserInterface) -> Result<bool> {
    let prompt = Prompt {
        key: OVERWRITE_KEY.to_string(),
        question: format!("{} exists. Overwrite?", path.display()),
        prompt_type: PromptType::Confirm,
        default: Some("true".to_string()),
    };
    Ok(ui.prompt(&prompt)?.as_bool().unwrap_or(false))
}

fn render_pipeline(pipeline: &PipelineTemplate, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => pipeline.to_yaml(),
        OutputFormat::Json => pipeline.to_json(),
    }
}

/// `<dir>/<stem>.<ext>`.
pub(super) fn document_path(dir: &Path, stem: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", stem, format.extension()))
}

/// Write a document, creating its directory.
pub(super) fn write_document(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use tempfile::TempDir;

    fn react_native_repo() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        fs::create_dir_all(temp.path().join("android")).unwrap();
        fs::write(temp.path().join("android/build.gradle"), "").unwrap();
        temp
    }

    fn command(temp: &TempDir, args: ConfigArgs) -> ConfigCommand {
        ConfigCommand::new(temp.path(), args)
    }

    #[test]
    fn missing_dir_fails() {
        let temp = TempDir::new().unwrap();
        let args = ConfigArgs {
            dir: PathBuf::from("nope"),
            ..Default::default()
        };
        let mut ui = MockUI::new();

        let result = command(&temp, args).execute(&mut ui).unwrap();

        assert_eq!(result.exit_code, 2);
        assert!(ui.has_error("Not a directory"));
    }

    #[test]
    fn non_interactive_writes_scan_result() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = command(&temp, ConfigArgs::default()).execute(&mut ui).unwrap();

        assert!(result.success);
        let written = fs::read_to_string(temp.path().join("_defaults/result.yml")).unwrap();
        assert!(written.contains("other-config"));
        assert!(!temp.path().join("_defaults/pipeline.yml").exists());
        assert_eq!(ui.spinners().len(), 1);
    }

    #[test]
    fn non_interactive_with_answers_writes_pipeline() {
        let temp = react_native_repo();
        let args = ConfigArgs {
            format: OutputFormat::Json,
            answers: vec![("BITRISE_PROJECT_PATH".to_string(), "./android".to_string())],
            ..Default::default()
        };
        let mut ui = MockUI::new();

        command(&temp, args).execute(&mut ui).unwrap();

        assert!(temp.path().join("_defaults/result.json").is_file());
        let pipeline = fs::read_to_string(temp.path().join("_defaults/pipeline.json")).unwrap();
        assert!(pipeline.contains("gradle-runner@"));
        assert!(pipeline.contains("./android"));
    }

    #[test]
    fn interactive_resolves_and_writes_pipeline() {
        let temp = react_native_repo();
        let mut ui = MockUI::new();
        ui.set_interactive(true);

        command(&temp, ConfigArgs::default()).execute(&mut ui).unwrap();

        let pipeline = fs::read_to_string(temp.path().join("_defaults/pipeline.yml")).unwrap();
        assert!(pipeline.contains("npm install"));
        assert!(!temp.path().join("_defaults/result.yml").exists());
        assert!(ui.has_success("Pipeline written"));
    }

    #[test]
    fn interactive_declined_overwrite_keeps_file() {
        let temp = TempDir::new().unwrap();
        let existing = temp.path().join("_defaults/pipeline.yml");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "keep me").unwrap();
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        ui.set_prompt_response(OVERWRITE_KEY, "no");

        command(&temp, ConfigArgs::default()).execute(&mut ui).unwrap();

        assert_eq!(fs::read_to_string(&existing).unwrap(), "keep me");
        assert!(ui.has_warning("Kept existing"));
    }

    #[test]
    fn ci_flag_skips_prompts() {
        let temp = react_native_repo();
        let mut ui = MockUI::new();
        ui.set_interactive(true);
        let args = ConfigArgs {
            ci: true,
            ..Default::default()
        };

        command(&temp, args).execute(&mut ui).unwrap();

        assert!(ui.prompts_shown().is_empty());
        assert!(temp.path().join("_defaults/result.yml").is_file());
    }

    #[test]
    fn unknown_platform_flag_is_rejected() {
        let temp = TempDir::new().unwrap();
        let args = ConfigArgs {
            platform: Some("symbian".to_string()),
            ..Default::default()
        };
        let mut ui = MockUI::new();

        let result = command(&temp, args).execute(&mut ui);

        assert!(matches!(result, Err(InitError::UnknownPlatform { .. })));
    }

    #[test]
    fn scan_warnings_are_shown() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();
        fs::write(temp.path().join("app/build.gradle"), "").unwrap();
        let mut ui = MockUI::new();

        command(&temp, ConfigArgs::default()).execute(&mut ui).unwrap();

        assert!(ui.has_warning("android:"));
    }
}
