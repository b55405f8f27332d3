//! Xamarin solutions.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::Result;
use crate::options::{OptionTree, PLACEHOLDER};
use crate::pipeline::builder::{PipelineBuilder, CI_RUN_IF, PRIMARY_WORKFLOW};
use crate::pipeline::catalog;
use crate::pipeline::StepCatalog;

use super::fs::{read_text, FileList};
use super::{ConfigMap, PlatformCapability, Warnings};

const NAME: &str = "xamarin";

const CONFIG_ID: &str = "xamarin-config";
const DEFAULT_CONFIG_ID: &str = "default-xamarin-config";

pub const SOLUTION_TITLE: &str = "Path to the Xamarin Solution file";
pub const SOLUTION_KEY: &str = "BITRISE_PROJECT_PATH";
pub const CONFIGURATION_TITLE: &str = "Xamarin solution configuration";
pub const CONFIGURATION_KEY: &str = "BITRISE_XAMARIN_CONFIGURATION";
pub const PLATFORM_TITLE: &str = "Xamarin solution platform";
pub const PLATFORM_KEY: &str = "BITRISE_XAMARIN_PLATFORM";

const XAMARIN_MARKERS: &[&str] = &["Xamarin.iOS", "Xamarin.Android", "Xamarin.Mac", "MonoAndroid"];

/// A solution with at least one Xamarin project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XamarinSolution {
    /// Display path of the `.sln`.
    pub path: String,
    /// Configuration → platforms.
    pub configurations: BTreeMap<String, BTreeSet<String>>,
}

/// `Project("{type}") = "Name", "Path\To\Name.csproj", "{guid}"`
static PROJECT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Project\("[^"]*"\)\s*=\s*"[^"]*",\s*"([^"]+)""#)
        .expect("PROJECT_REGEX must compile")
});

/// `Release|iPhone = Release|iPhone`
static CONFIGURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^|=]+)\|([^=]+?)\s*=").expect("CONFIGURATION_REGEX must compile")
});

/// Project file paths referenced by a solution, with `/` separators.
pub fn solution_projects(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| PROJECT_REGEX.captures(line.trim()))
        .map(|caps| caps[1].replace('\\', "/"))
        .filter(|path| path.ends_with(".csproj"))
        .collect()
}

/// Configuration/platform pairs declared by a solution.
pub fn solution_configurations(content: &str) -> BTreeMap<String, BTreeSet<String>> {
    let mut configurations: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut in_section = false;

    for line in content.lines().map(str::trim) {
        if line.starts_with("GlobalSection(SolutionConfigurationPlatforms)") {
            in_section = true;
        } else if line.starts_with("EndGlobalSection") {
            in_section = false;
        } else if in_section {
            if let Some(caps) = CONFIGURATION_REGEX.captures(line) {
                configurations
                    .entry(caps[1].trim().to_string())
                    .or_default()
                    .insert(caps[2].trim().to_string());
            }
        }
    }

    configurations
}

/// Detects solutions referencing Xamarin projects.
pub struct XamarinScanner {
    catalog: Arc<StepCatalog>,
    solutions: Vec<XamarinSolution>,
}

impl XamarinScanner {
    /// Create a scanner.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            catalog,
            solutions: Vec::new(),
        }
    }

    /// Solutions found by the last detection.
    pub fn solutions(&self) -> &[XamarinSolution] {
        &self.solutions
    }

    fn template(&self) -> Result<String> {
        let builder = PipelineBuilder::new(&self.catalog, NAME);
        let mut steps = builder.prepare_steps()?;
        steps.push(builder.step(catalog::CERTIFICATE_AND_PROFILE_INSTALLER)?);
        steps.push(builder.step(catalog::XAMARIN_USER_MANAGEMENT)?.with_run_if(CI_RUN_IF));
        steps.push(builder.step(catalog::NUGET_RESTORE)?);
        steps.push(builder.step(catalog::XAMARIN_COMPONENTS_RESTORE)?);
        steps.push(
            builder
                .step(catalog::XAMARIN_ARCHIVE)?
                .with_input("xamarin_solution", "$BITRISE_PROJECT_PATH")
                .with_input("xamarin_configuration", "$BITRISE_XAMARIN_CONFIGURATION")
                .with_input("xamarin_platform", "$BITRISE_XAMARIN_PLATFORM"),
        );
        builder.workflow(PRIMARY_WORKFLOW, steps)?.render()
    }
}

impl PlatformCapability for XamarinScanner {
    fn name(&self) -> &str {
        NAME
    }

    fn detect_files(&mut self, files: &FileList) -> Result<bool> {
        self.solutions.clear();

        tracing::info!("Searching for Xamarin solutions");

        for entry in files.with_extension("sln") {
            let content = files.read(entry)?;

            let mut is_xamarin = false;
            for project in solution_projects(&content) {
                let csproj = entry.path.parent().unwrap_or(files.root()).join(&project);
                if !csproj.is_file() {
                    tracing::debug!(project = %project, "Referenced project not found");
                    continue;
                }
                let text = read_text(&csproj)?;
                if XAMARIN_MARKERS.iter().any(|m| text.contains(m)) {
                    is_xamarin = true;
                    break;
                }
            }

            if is_xamarin {
                tracing::debug!(solution = %entry.display(), "Found Xamarin solution");
                self.solutions.push(XamarinSolution {
                    path: entry.display(),
                    configurations: solution_configurations(&content),
                });
            }
        }

        Ok(!self.solutions.is_empty())
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        let mut warnings = Warnings::new();
        let mut b = OptionTree::builder();
        let leaf = b.leaf(CONFIG_ID);

        let mut solutions = Vec::new();
        for solution in &self.solutions {
            let configuration = if solution.configurations.is_empty() {
                warnings.push(format!("No configurations found in {}", solution.path));
                let platform = b.input(PLATFORM_TITLE, PLATFORM_KEY, leaf)?;
                b.input(CONFIGURATION_TITLE, CONFIGURATION_KEY, platform)?
            } else {
                let mut children = Vec::new();
                for (configuration, platforms) in &solution.configurations {
                    let platform = b.question(
                        PLATFORM_TITLE,
                        Some(PLATFORM_KEY),
                        platforms.iter().map(|p| (p.as_str(), leaf)),
                    )?;
                    children.push((configuration.as_str(), platform));
                }
                b.question(CONFIGURATION_TITLE, Some(CONFIGURATION_KEY), children)?
            };
            solutions.push((solution.path.as_str(), configuration));
        }

        let root = b.question(SOLUTION_TITLE, Some(SOLUTION_KEY), solutions)?;
        Ok((b.build(root)?, warnings))
    }

    fn default_options(&self) -> Result<OptionTree> {
        let mut b = OptionTree::builder();
        let leaf = b.leaf(DEFAULT_CONFIG_ID);
        let platform = b.input(PLATFORM_TITLE, PLATFORM_KEY, leaf)?;
        let configuration = b.input(CONFIGURATION_TITLE, CONFIGURATION_KEY, platform)?;
        let solution = b.input(SOLUTION_TITLE, SOLUTION_KEY, configuration)?;
        b.build(solution)
    }

    fn configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(CONFIG_ID.to_string(), self.template()?)]))
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(DEFAULT_CONFIG_ID.to_string(), self.template()?)]))
    }
}
