//! Xcode projects and workspaces for iOS and macOS.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::options::{NodeId, OptionTree, OptionTreeBuilder, PLACEHOLDER};
use crate::pipeline::builder::{PipelineBuilder, DEPLOY_WORKFLOW, PRIMARY_WORKFLOW};
use crate::pipeline::catalog;
use crate::pipeline::StepCatalog;

use super::fs::{read_text, FileEntry, FileList};
use super::{ConfigMap, PlatformCapability, Warnings};

pub const PROJECT_TITLE: &str = "Project (or Workspace) path";
pub const PROJECT_KEY: &str = "BITRISE_PROJECT_PATH";
pub const SCHEME_TITLE: &str = "Scheme name";
pub const SCHEME_KEY: &str = "BITRISE_SCHEME";

/// Target SDK of an Xcode project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XcodePlatform {
    Ios,
    MacOs,
}

impl XcodePlatform {
    /// Platform name used in scan results.
    pub fn name(self) -> &'static str {
        match self {
            XcodePlatform::Ios => "ios",
            XcodePlatform::MacOs => "macos",
        }
    }

    fn test_step(self) -> &'static str {
        match self {
            XcodePlatform::Ios => catalog::XCODE_TEST,
            XcodePlatform::MacOs => catalog::XCODE_TEST_MAC,
        }
    }

    fn archive_step(self) -> &'static str {
        match self {
            XcodePlatform::Ios => catalog::XCODE_ARCHIVE,
            XcodePlatform::MacOs => catalog::XCODE_ARCHIVE_MAC,
        }
    }

    /// Read `SDKROOT` from a project file; iOS unless it says macOS.
    fn from_pbxproj(content: &str) -> Self {
        let macos = content.lines().any(|line| {
            let line = line.trim();
            line.starts_with("SDKROOT") && line.contains("macosx")
        });
        if macos {
            XcodePlatform::MacOs
        } else {
            XcodePlatform::Ios
        }
    }
}

/// A buildable project or workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeProject {
    /// Display path of the `.xcodeproj`/`.xcworkspace`.
    pub path: String,
    /// Directory holding it, relative to the root.
    pub dir: PathBuf,
    pub sdk: XcodePlatform,
    /// Shared schemes, sorted.
    pub schemes: Vec<String>,
    /// True when a Podfile sits next to it.
    pub uses_pods: bool,
}

fn shared_schemes(bundle: &Path) -> Result<Vec<String>> {
    let dir = bundle.join("xcshareddata").join("xcschemes");
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut schemes = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("xcscheme") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                schemes.push(stem.to_string());
            }
        }
    }
    schemes.sort();
    Ok(schemes)
}

fn read_sdk(bundle: &FileEntry) -> Result<XcodePlatform> {
    let pbxproj = bundle.path.join("project.pbxproj");
    if !pbxproj.is_file() {
        return Ok(XcodePlatform::Ios);
    }
    Ok(XcodePlatform::from_pbxproj(&read_text(&pbxproj)?))
}

/// Find projects and workspaces in a listing, any SDK.
///
/// A workspace takes the SDK of the project next to it and replaces the
/// projects of its directory, adding their schemes to its own.
pub fn xcode_projects(files: &FileList) -> Result<Vec<XcodeProject>> {
    let mut projects = Vec::new();

    for bundle in files.with_extension("xcodeproj") {
        projects.push(XcodeProject {
            path: bundle.display(),
            dir: bundle.relative_dir().to_path_buf(),
            sdk: read_sdk(bundle)?,
            schemes: shared_schemes(&bundle.path)?,
            uses_pods: files.contains(&bundle.relative_dir().join("Podfile")),
        });
    }

    let mut workspaces = Vec::new();
    for bundle in files.with_extension("xcworkspace") {
        let dir = bundle.relative_dir().to_path_buf();
        let siblings: Vec<&XcodeProject> = projects.iter().filter(|p| p.dir == dir).collect();

        let mut schemes = shared_schemes(&bundle.path)?;
        for sibling in &siblings {
            schemes.extend(sibling.schemes.iter().cloned());
        }
        schemes.sort();
        schemes.dedup();

        workspaces.push(XcodeProject {
            path: bundle.display(),
            sdk: siblings.first().map_or(XcodePlatform::Ios, |p| p.sdk),
            schemes,
            uses_pods: files.contains(&dir.join("Podfile")),
            dir,
        });
    }

    projects.retain(|p| !workspaces.iter().any(|w| w.dir == p.dir));
    projects.extend(workspaces);
    projects.sort_by(|a, b| {
        a.dir
            .components()
            .count()
            .cmp(&b.dir.components().count())
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(projects)
}

/// Add `project → scheme → leaf` for every project and return the project
/// question. Projects without shared schemes accept any scheme name.
pub(crate) fn project_question<F>(
    b: &mut OptionTreeBuilder,
    warnings: &mut Warnings,
    projects: &[XcodeProject],
    mut leaf_for: F,
) -> Result<NodeId>
where
    F: FnMut(&mut OptionTreeBuilder, &XcodeProject) -> Result<NodeId>,
{
    let mut children = Vec::new();

    for project in projects {
        let leaf = leaf_for(b, project)?;
        let schemes = if project.schemes.is_empty() {
            warnings.push(format!("No shared schemes found for {}", project.path));
            vec![PLACEHOLDER.to_string()]
        } else {
            project.schemes.clone()
        };
        let scheme = b.question(
            SCHEME_TITLE,
            Some(SCHEME_KEY),
            schemes.into_iter().map(|s| (s, leaf)),
        )?;
        children.push((project.path.clone(), scheme));
    }

    b.question(PROJECT_TITLE, Some(PROJECT_KEY), children)
}

/// Detects Xcode projects targeting one SDK.
pub struct XcodeScanner {
    platform: XcodePlatform,
    catalog: Arc<StepCatalog>,
    projects: Vec<XcodeProject>,
}

impl XcodeScanner {
    /// Create a scanner for `platform`.
    pub fn new(platform: XcodePlatform, catalog: Arc<StepCatalog>) -> Self {
        Self {
            platform,
            catalog,
            projects: Vec::new(),
        }
    }

    /// Projects found by the last detection.
    pub fn projects(&self) -> &[XcodeProject] {
        &self.projects
    }

    fn config_id(&self, uses_pods: bool) -> String {
        if uses_pods {
            format!("{}-pod-config", self.platform.name())
        } else {
            format!("{}-config", self.platform.name())
        }
    }

    fn default_config_id(&self) -> String {
        format!("default-{}-config", self.platform.name())
    }

    fn template(&self, uses_pods: bool) -> Result<String> {
        let builder = PipelineBuilder::new(&self.catalog, self.platform.name());

        let mut prepare = builder.prepare_steps()?;
        prepare.push(builder.step(catalog::CERTIFICATE_AND_PROFILE_INSTALLER)?);
        prepare.push(
            builder
                .step(catalog::RECREATE_USER_SCHEMES)?
                .with_input("project_path", "$BITRISE_PROJECT_PATH"),
        );
        if uses_pods {
            prepare.push(builder.step(catalog::COCOAPODS_INSTALL)?);
        }
        prepare.push(
            builder
                .step(self.platform.test_step())?
                .with_input("project_path", "$BITRISE_PROJECT_PATH")
                .with_input("scheme", "$BITRISE_SCHEME"),
        );

        let mut deploy = prepare.clone();
        deploy.push(
            builder
                .step(self.platform.archive_step())?
                .with_input("project_path", "$BITRISE_PROJECT_PATH")
                .with_input("scheme", "$BITRISE_SCHEME"),
        );

        builder
            .workflow(PRIMARY_WORKFLOW, prepare)?
            .workflow(DEPLOY_WORKFLOW, deploy)?
            .render()
    }
}

impl PlatformCapability for XcodeScanner {
    fn name(&self) -> &str {
        self.platform.name()
    }

    fn detect_files(&mut self, files: &FileList) -> Result<bool> {
        tracing::info!(platform = self.platform.name(), "Searching for Xcode projects");

        let platform = self.platform;
        self.projects = xcode_projects(files)?
            .into_iter()
            .filter(|p| p.sdk == platform)
            .collect();

        for project in &self.projects {
            tracing::debug!(
                path = %project.path,
                schemes = project.schemes.len(),
                "Found Xcode project"
            );
        }

        Ok(!self.projects.is_empty())
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        let mut warnings = Warnings::new();
        let mut b = OptionTree::builder();

        let plain = b.leaf(self.config_id(false));
        let pods = b.leaf(self.config_id(true));
        let root = project_question(&mut b, &mut warnings, &self.projects, |_, project| {
            Ok(if project.uses_pods { pods } else { plain })
        })?;

        Ok((b.build(root)?, warnings))
    }

    fn default_options(&self) -> Result<OptionTree> {
        let mut b = OptionTree::builder();
        let leaf = b.leaf(self.default_config_id());
        let scheme = b.input(SCHEME_TITLE, SCHEME_KEY, leaf)?;
        let project = b.input(PROJECT_TITLE, PROJECT_KEY, scheme)?;
        b.build(project)
    }

    fn configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        for uses_pods in [false, true] {
            if self.projects.iter().any(|p| p.uses_pods == uses_pods) {
                configs.insert(self.config_id(uses_pods), self.template(uses_pods)?);
            }
        }
        Ok(configs)
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(self.default_config_id(), self.template(true)?)]))
    }
}
