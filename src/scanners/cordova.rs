//! Cordova projects.

use std::sync::Arc;

use crate::error::Result;
use crate::options::OptionTree;
use crate::pipeline::builder::{PipelineBuilder, PRIMARY_WORKFLOW};
use crate::pipeline::catalog;
use crate::pipeline::StepCatalog;

use super::fs::FileList;
use super::{ConfigMap, PlatformCapability, Warnings};

const NAME: &str = "cordova";

const CONFIG_ID: &str = "cordova-config";
const DEFAULT_CONFIG_ID: &str = "default-cordova-config";

pub const WORK_DIR_TITLE: &str = "Directory of Cordova Config.xml";
pub const WORK_DIR_KEY: &str = "CORDOVA_WORK_DIR";
pub const PLATFORM_TITLE: &str = "Platform to use in cordova-cli commands";
pub const PLATFORM_KEY: &str = "CORDOVA_PLATFORM";

const PLATFORMS: &[&str] = &["android", "ios", "ios,android"];

/// Detects Cordova apps by their `config.xml`.
pub struct CordovaScanner {
    catalog: Arc<StepCatalog>,
    work_dir: Option<String>,
    warnings: Warnings,
}

impl CordovaScanner {
    /// Create a scanner.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            catalog,
            work_dir: None,
            warnings: Warnings::new(),
        }
    }

    /// Display path of the detected project directory.
    pub fn work_dir(&self) -> Option<&str> {
        self.work_dir.as_deref()
    }

    fn template(&self) -> Result<String> {
        let builder = PipelineBuilder::new(&self.catalog, NAME);
        let mut steps = builder.prepare_steps()?;
        steps.push(builder.step(catalog::GENERATE_CORDOVA_BUILD_CONFIGURATION)?);
        steps.push(
            builder
                .step(catalog::CORDOVA_ARCHIVE)?
                .with_input("workdir", "$CORDOVA_WORK_DIR")
                .with_input("platform", "$CORDOVA_PLATFORM")
                .with_input("target", "emulator"),
        );
        builder.workflow(PRIMARY_WORKFLOW, steps)?.render()
    }

    fn tree(&self, config_id: &str, work_dir: &str) -> Result<OptionTree> {
        let mut b = OptionTree::builder();
        let leaf = b.leaf(config_id);
        let platform = b.question(
            PLATFORM_TITLE,
            Some(PLATFORM_KEY),
            PLATFORMS.iter().map(|p| (*p, leaf)),
        )?;
        let root = b.question(WORK_DIR_TITLE, Some(WORK_DIR_KEY), [(work_dir, platform)])?;
        b.build(root)
    }
}

impl PlatformCapability for CordovaScanner {
    fn name(&self) -> &str {
        NAME
    }

    fn detect_files(&mut self, files: &FileList) -> Result<bool> {
        self.work_dir = None;
        self.warnings.clear();

        tracing::info!("Searching for config.xml");

        let mut config = None;
        for entry in files.named("config.xml") {
            if files.read(entry)?.contains("<widget") {
                config = Some(entry);
                break;
            }
        }
        let Some(config) = config else {
            return Ok(false);
        };

        let package_dirs: Vec<_> = files.named("package.json").map(|e| e.relative_dir()).collect();
        if !package_dirs.is_empty() && !package_dirs.contains(&config.relative_dir()) {
            let package = files
                .named("package.json")
                .next()
                .map(|e| e.display())
                .unwrap_or_default();
            let message = format!(
                "Cordova config.xml ({}) and package.json ({}) are in different directories",
                config.display(),
                package
            );
            tracing::warn!("{}", message);
            self.warnings.push(message);
            return Ok(false);
        }

        tracing::debug!(config = %config.display(), "Found Cordova project");
        self.work_dir = Some(config.display_dir());
        Ok(true)
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        let work_dir = self.work_dir.as_deref().unwrap_or("./");
        Ok((self.tree(CONFIG_ID, work_dir)?, Warnings::new()))
    }

    fn default_options(&self) -> Result<OptionTree> {
        self.tree(DEFAULT_CONFIG_ID, crate::options::PLACEHOLDER)
    }

    fn configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(CONFIG_ID.to_string(), self.template()?)]))
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(DEFAULT_CONFIG_ID.to_string(), self.template()?)]))
    }

    fn detection_warnings(&self) -> Warnings {
        self.warnings.clone()
    }
}
