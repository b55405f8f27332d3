//! Gradle-based Android projects.

use std::sync::Arc;

use crate::error::Result;
use crate::options::{OptionTree, PLACEHOLDER};
use crate::pipeline::builder::{PipelineBuilder, PRIMARY_WORKFLOW};
use crate::pipeline::catalog;
use crate::pipeline::StepCatalog;

use super::fs::{FileEntry, FileList};
use super::{ConfigMap, PlatformCapability, Warnings};

const NAME: &str = "android";
const PROJECT_TYPE: &str = "android";

const CONFIG_ID: &str = "android-config";
const DEFAULT_CONFIG_ID: &str = "default-android-config";

pub const BUILD_FILE_TITLE: &str = "Path to the gradle file to use";
pub const BUILD_FILE_KEY: &str = "GRADLE_BUILD_FILE_PATH";
pub const GRADLEW_TITLE: &str = "Gradlew file path";
pub const GRADLEW_KEY: &str = "GRADLEW_PATH";
pub const TASK_TITLE: &str = "Gradle task to run";
pub const TASK_KEY: &str = "GRADLE_TASK";

const BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts"];
const SETTINGS_FILES: &[&str] = &["settings.gradle", "settings.gradle.kts"];
const TASKS: &[&str] = &["assemble", "assembleDebug", "assembleRelease"];

/// A root gradle project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradleProject {
    /// Display path of the build file.
    pub build_file: String,
    /// Display path of the project directory.
    pub dir: String,
    /// Display path of the sibling wrapper, if present.
    pub gradlew: Option<String>,
}

/// Find root gradle projects in a listing.
///
/// Build files next to a settings file are roots. Without any, the shallowest
/// build files are used.
pub fn gradle_projects(files: &FileList) -> Vec<GradleProject> {
    let build_files: Vec<&FileEntry> = files
        .entries()
        .iter()
        .filter(|e| !e.is_dir && BUILD_FILES.contains(&e.file_name()))
        .collect();

    let with_settings: Vec<&FileEntry> = build_files
        .iter()
        .copied()
        .filter(|e| {
            SETTINGS_FILES
                .iter()
                .any(|s| files.contains(&e.relative_dir().join(s)))
        })
        .collect();

    let roots = if with_settings.is_empty() {
        let shallowest = build_files.iter().map(|e| e.depth()).min();
        build_files
            .into_iter()
            .filter(|e| Some(e.depth()) == shallowest)
            .collect()
    } else {
        with_settings
    };

    roots
        .into_iter()
        .map(|entry| {
            let gradlew = entry.relative_dir().join("gradlew");
            GradleProject {
                build_file: entry.display(),
                dir: entry.display_dir(),
                gradlew: files
                    .contains(&gradlew)
                    .then(|| super::fs::display_path(&gradlew)),
            }
        })
        .collect()
}

/// Detects Android gradle projects.
pub struct AndroidScanner {
    catalog: Arc<StepCatalog>,
    projects: Vec<GradleProject>,
}

impl AndroidScanner {
    /// Create a scanner.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            catalog,
            projects: Vec::new(),
        }
    }

    /// Projects found by the last detection.
    pub fn projects(&self) -> &[GradleProject] {
        &self.projects
    }

    fn template(&self) -> Result<String> {
        let builder = PipelineBuilder::new(&self.catalog, PROJECT_TYPE);
        let mut steps = builder.prepare_steps()?;
        steps.push(builder.step(catalog::INSTALL_MISSING_ANDROID_TOOLS)?);
        steps.push(
            builder
                .step(catalog::GRADLE_RUNNER)?
                .with_input("gradle_file", "$GRADLE_BUILD_FILE_PATH")
                .with_input("gradle_task", "$GRADLE_TASK")
                .with_input("gradlew_path", "$GRADLEW_PATH"),
        );
        builder.workflow(PRIMARY_WORKFLOW, steps)?.render()
    }
}

impl PlatformCapability for AndroidScanner {
    fn name(&self) -> &str {
        NAME
    }

    fn detect_files(&mut self, files: &FileList) -> Result<bool> {
        tracing::info!("Searching for gradle files");

        self.projects = gradle_projects(files);

        for project in &self.projects {
            tracing::debug!(build_file = %project.build_file, "Found gradle project");
        }

        Ok(!self.projects.is_empty())
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        let mut warnings = Warnings::new();
        let mut b = OptionTree::builder();

        let leaf = b.leaf(CONFIG_ID);
        let task = b.question(TASK_TITLE, Some(TASK_KEY), TASKS.iter().map(|t| (*t, leaf)))?;

        let mut build_files = Vec::new();
        for project in &self.projects {
            let gradlew = match &project.gradlew {
                Some(path) => path.clone(),
                None => {
                    warnings.push(format!("No gradlew found next to {}", project.build_file));
                    PLACEHOLDER.to_string()
                }
            };
            let node = b.question(GRADLEW_TITLE, Some(GRADLEW_KEY), [(gradlew, task)])?;
            build_files.push((project.build_file.clone(), node));
        }

        let root = b.question(BUILD_FILE_TITLE, Some(BUILD_FILE_KEY), build_files)?;
        Ok((b.build(root)?, warnings))
    }

    fn default_options(&self) -> Result<OptionTree> {
        let mut b = OptionTree::builder();
        let leaf = b.leaf(DEFAULT_CONFIG_ID);
        let task = b.input(TASK_TITLE, TASK_KEY, leaf)?;
        let build_file = b.input(BUILD_FILE_TITLE, BUILD_FILE_KEY, task)?;
        let gradlew = b.input(GRADLEW_TITLE, GRADLEW_KEY, build_file)?;
        b.build(gradlew)
    }

    fn configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(CONFIG_ID.to_string(), self.template()?)]))
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(DEFAULT_CONFIG_ID.to_string(), self.template()?)]))
    }
}
