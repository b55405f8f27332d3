//! Manual-config command implementation.
//!
//! The `pipeline-init manual-config` command writes every platform's default
//! option tree and templates without looking at a repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::args::{ManualConfigArgs, OutputFormat};
use crate::error::Result;
use crate::pipeline::StepCatalog;
use crate::scan::Scanner;
use crate::ui::UserInterface;

use super::config::{document_path, write_document, RESULT_STEM};
use super::dispatcher::{Command, CommandResult};

/// The manual-config command implementation.
pub struct ManualConfigCommand {
    working_dir: PathBuf,
    args: ManualConfigArgs,
}

impl ManualConfigCommand {
    /// Create a new manual-config command.
    pub fn new(working_dir: &Path, args: ManualConfigArgs) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            args,
        }
    }
}

impl Command for ManualConfigCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let scanner = Scanner::new(Arc::new(StepCatalog::builtin()?));
        let dump = scanner.manual_dump()?;

        let content = match self.args.format {
            OutputFormat::Yaml => dump.to_yaml()?,
            OutputFormat::Json => dump.to_json()?,
        };

        let path = document_path(
            &self.working_dir.join(&self.args.output_dir),
            RESULT_STEM,
            self.args.format,
        );
        write_document(&path, &content)?;

        ui.success(&format!("Manual configuration written to {}", path.display()));
        Ok(CommandResult::success())
    }
}
