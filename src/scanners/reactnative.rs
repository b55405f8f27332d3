//! React Native apps.
//!
//! A React Native app is an npm package whose `android/` and `ios/`
//! directories hold native projects. The native projects are found with
//! private Android and iOS scanners; once React Native is detected, those
//! platforms are excluded so the app is not offered three times.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::options::{NodeId, OptionTree, OptionTreeBuilder};
use crate::pipeline::builder::{PipelineBuilder, PRIMARY_WORKFLOW};
use crate::pipeline::catalog;
use crate::pipeline::{StepCatalog, StepListItem};

use super::android::{AndroidScanner, GradleProject};
use super::fs::{display_path, FileList};
use super::xcode::{self, XcodePlatform, XcodeProject, XcodeScanner};
use super::{ConfigMap, PlatformCapability, Warnings};

const NAME: &str = "reactnative";
const PROJECT_TYPE: &str = "react-native";

pub const BUILD_PLATFORM_TITLE: &str = "Build platform";
pub const ANDROID_PATH_TITLE: &str = "Android project path";
pub const PROJECT_PATH_KEY: &str = "BITRISE_PROJECT_PATH";
pub const ANDROID_PATH_KEY: &str = "ANDROID_PROJECT_PATH";

pub const ANDROID: &str = "Android";
pub const IOS: &str = "iOS";
pub const IOS_ANDROID: &str = "iOS + Android";

/// One buildable target combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Android,
    Ios,
    IosAndroid,
}

impl Target {
    fn config_id(self) -> &'static str {
        match self {
            Target::Android => "reactnative-android-config",
            Target::Ios => "reactnative-ios-config",
            Target::IosAndroid => "reactnative-ios-android-config",
        }
    }

    fn default_config_id(self) -> &'static str {
        match self {
            Target::Android => "default-reactnative-android-config",
            Target::Ios => "default-reactnative-ios-config",
            Target::IosAndroid => "default-reactnative-ios-android-config",
        }
    }
}

/// Detects React Native apps.
pub struct ReactNativeScanner {
    catalog: Arc<StepCatalog>,
    android: AndroidScanner,
    ios: XcodeScanner,
    package_dir: Option<PathBuf>,
    android_project: Option<GradleProject>,
    ios_projects: Vec<XcodeProject>,
}

impl ReactNativeScanner {
    /// Create a scanner with its own native sub-scanners.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            android: AndroidScanner::new(Arc::clone(&catalog)),
            ios: XcodeScanner::new(XcodePlatform::Ios, Arc::clone(&catalog)),
            catalog,
            package_dir: None,
            android_project: None,
            ios_projects: Vec::new(),
        }
    }

    /// Display path of the detected npm package.
    pub fn package_dir(&self) -> Option<String> {
        self.package_dir.as_deref().map(display_path)
    }

    fn targets(&self) -> Vec<Target> {
        let mut targets = Vec::new();
        if self.android_project.is_some() {
            targets.push(Target::Android);
        }
        if !self.ios_projects.is_empty() {
            targets.push(Target::Ios);
        }
        if targets.len() == 2 {
            targets.push(Target::IosAndroid);
        }
        targets
    }

    fn npm_install(&self, builder: &PipelineBuilder<'_>) -> Result<StepListItem> {
        builder.script("Install npm packages", "npm install")
    }

    fn gradle_runner(
        &self,
        builder: &PipelineBuilder<'_>,
        project_key: &str,
    ) -> Result<StepListItem> {
        Ok(builder
            .step(catalog::GRADLE_RUNNER)?
            .with_input("gradle_file", &format!("${}/build.gradle", project_key))
            .with_input("gradle_task", "assembleRelease")
            .with_input("gradlew_path", &format!("${}/gradlew", project_key)))
    }

    fn xcode_archive(&self, builder: &PipelineBuilder<'_>) -> Result<Vec<StepListItem>> {
        Ok(vec![
            builder.step(catalog::CERTIFICATE_AND_PROFILE_INSTALLER)?,
            builder
                .step(catalog::XCODE_ARCHIVE)?
                .with_input("project_path", "$BITRISE_PROJECT_PATH")
                .with_input("scheme", "$BITRISE_SCHEME"),
        ])
    }

    fn template(&self, target: Target) -> Result<String> {
        let builder = PipelineBuilder::new(&self.catalog, PROJECT_TYPE);
        let mut steps = builder.checkout_steps()?;
        steps.push(self.npm_install(&builder)?);

        match target {
            Target::Android => {
                steps.push(self.gradle_runner(&builder, PROJECT_PATH_KEY)?);
            }
            Target::Ios => {
                steps.extend(self.xcode_archive(&builder)?);
            }
            Target::IosAndroid => {
                steps.push(self.gradle_runner(&builder, ANDROID_PATH_KEY)?);
                steps.extend(self.xcode_archive(&builder)?);
            }
        }

        builder.workflow(PRIMARY_WORKFLOW, steps)?.render()
    }

    fn android_question(
        b: &mut OptionTreeBuilder,
        key: &str,
        dir: &str,
        next: NodeId,
    ) -> Result<NodeId> {
        b.question(ANDROID_PATH_TITLE, Some(key), [(dir, next)])
    }
}

impl PlatformCapability for ReactNativeScanner {
    fn name(&self) -> &str {
        NAME
    }

    fn detect_files(&mut self, files: &FileList) -> Result<bool> {
        self.package_dir = None;
        self.android_project = None;
        self.ios_projects.clear();

        tracing::info!("Searching for React Native project files");

        self.android.detect_files(files)?;
        self.ios.detect_files(files)?;

        for package in files.named("package.json") {
            let dir = package.relative_dir();
            let android_dir = display_path(&dir.join("android"));
            let ios_dir = dir.join("ios");

            let android = self
                .android
                .projects()
                .iter()
                .find(|p| p.dir == android_dir)
                .cloned();
            let ios: Vec<XcodeProject> = self
                .ios
                .projects()
                .iter()
                .filter(|p| p.dir.starts_with(&ios_dir))
                .cloned()
                .collect();

            if android.is_some() || !ios.is_empty() {
                tracing::debug!(
                    package = %package.display(),
                    android = android.is_some(),
                    ios = ios.len(),
                    "Found React Native project"
                );
                self.package_dir = Some(dir.to_path_buf());
                self.android_project = android;
                self.ios_projects = ios;
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        let mut warnings = Warnings::new();
        let mut b = OptionTree::builder();
        let mut platforms = Vec::new();

        for target in self.targets() {
            let leaf = b.leaf(target.config_id());
            let node = match (target, &self.android_project) {
                (Target::Android, Some(android)) => {
                    Self::android_question(&mut b, PROJECT_PATH_KEY, &android.dir, leaf)?
                }
                (Target::Ios, _) => xcode::project_question(
                    &mut b,
                    &mut warnings,
                    &self.ios_projects,
                    |_, _| Ok(leaf),
                )?,
                (Target::IosAndroid, Some(android)) => {
                    let android_path =
                        Self::android_question(&mut b, ANDROID_PATH_KEY, &android.dir, leaf)?;
                    // Scheme warnings were already recorded for the iOS branch.
                    let mut repeated = Warnings::new();
                    xcode::project_question(&mut b, &mut repeated, &self.ios_projects, |_, _| {
                        Ok(android_path)
                    })?
                }
                _ => continue,
            };
            let answer = match target {
                Target::Android => ANDROID,
                Target::Ios => IOS,
                Target::IosAndroid => IOS_ANDROID,
            };
            platforms.push((answer, node));
        }

        let root = b.question(BUILD_PLATFORM_TITLE, None, platforms)?;
        Ok((b.build(root)?, warnings))
    }

    fn default_options(&self) -> Result<OptionTree> {
        let mut b = OptionTree::builder();

        let android_leaf = b.leaf(Target::Android.default_config_id());
        let android = b.input(ANDROID_PATH_TITLE, PROJECT_PATH_KEY, android_leaf)?;

        let ios_leaf = b.leaf(Target::Ios.default_config_id());
        let ios_scheme = b.input(xcode::SCHEME_TITLE, xcode::SCHEME_KEY, ios_leaf)?;
        let ios = b.input(xcode::PROJECT_TITLE, xcode::PROJECT_KEY, ios_scheme)?;

        let both_leaf = b.leaf(Target::IosAndroid.default_config_id());
        let both_android = b.input(ANDROID_PATH_TITLE, ANDROID_PATH_KEY, both_leaf)?;
        let both_scheme = b.input(xcode::SCHEME_TITLE, xcode::SCHEME_KEY, both_android)?;
        let both = b.input(xcode::PROJECT_TITLE, xcode::PROJECT_KEY, both_scheme)?;

        let root = b.question(
            BUILD_PLATFORM_TITLE,
            None,
            [(ANDROID, android), (IOS, ios), (IOS_ANDROID, both)],
        )?;
        b.build(root)
    }

    fn configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        for target in self.targets() {
            configs.insert(target.config_id().to_string(), self.template(target)?);
        }
        Ok(configs)
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let mut configs = ConfigMap::new();
        for target in [Target::Android, Target::Ios, Target::IosAndroid] {
            configs.insert(target.default_config_id().to_string(), self.template(target)?);
        }
        Ok(configs)
    }

    fn excluded_platforms(&self) -> Vec<String> {
        vec!["android".to_string(), "ios".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{resolve, AnswerSource, Question};
    use crate::pipeline::{compile, EnvAssignment};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn scanner() -> ReactNativeScanner {
        ReactNativeScanner::new(Arc::new(StepCatalog::builtin().unwrap()))
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn ios_project(root: &Path) {
        write(root, "ios/App.xcodeproj/project.pbxproj", "SDKROOT = iphoneos;");
        write(root, "ios/App.xcodeproj/xcshareddata/xcschemes/App.xcscheme", "<Scheme/>");
    }

    struct Choose(&'static str);

    impl AnswerSource for Choose {
        fn provide(&mut self, question: &Question) -> Result<String> {
            Ok(format!("typed {}", question.title))
        }

        fn choose(&mut self, _question: &Question, _answers: &[&str]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn android_only_app() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{}");
        write(temp.path(), "android/build.gradle", "");

        let mut scanner = scanner();
        assert!(scanner.detect_platform(temp.path()).unwrap());
        assert_eq!(scanner.package_dir().as_deref(), Some("./"));

        let (tree, warnings) = scanner.options().unwrap();
        assert!(warnings.is_empty());
        let root = tree.question(tree.root()).unwrap();
        assert_eq!(root.answers(), vec![ANDROID]);
        assert_eq!(root.env_key, None);

        let resolution = resolve(&tree, &mut Choose("unused")).unwrap();
        assert_eq!(resolution.config_id, "reactnative-android-config");
        assert_eq!(
            resolution.envs,
            vec![EnvAssignment::new(PROJECT_PATH_KEY, "./android")]
        );
    }

    #[test]
    fn android_template_is_npm_then_gradle() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{}");
        write(temp.path(), "android/build.gradle", "");

        let mut scanner = scanner();
        scanner.detect_platform(temp.path()).unwrap();
        let configs = scanner.configs().unwrap();

        let pipeline = compile(NAME, "reactnative-android-config", &[], &configs).unwrap();
        let primary = pipeline.workflow(PRIMARY_WORKFLOW).unwrap();
        assert_eq!(
            primary.step_ids(),
            vec![
                "activate-ssh-key",
                "git-clone",
                "script",
                "gradle-runner",
                "deploy-to-bitrise-io",
            ]
        );
        assert_eq!(primary.steps[2].step.inputs[0].value, "npm install");
        assert_eq!(primary.steps[3].step.inputs[0].value, "$BITRISE_PROJECT_PATH/build.gradle");
    }

    #[test]
    fn both_platforms_offer_combined_build() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{}");
        write(temp.path(), "android/build.gradle", "");
        ios_project(temp.path());

        let mut scanner = scanner();
        assert!(scanner.detect_platform(temp.path()).unwrap());
        let (tree, _) = scanner.options().unwrap();

        let root = tree.question(tree.root()).unwrap();
        assert_eq!(root.answers(), vec![ANDROID, IOS, IOS_ANDROID]);

        let resolution = resolve(&tree, &mut Choose(IOS_ANDROID)).unwrap();
        assert_eq!(resolution.config_id, "reactnative-ios-android-config");
        let keys: Vec<_> = resolution.envs.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec![PROJECT_PATH_KEY, "BITRISE_SCHEME", ANDROID_PATH_KEY]);
        assert_eq!(resolution.envs[0].value, "./ios/App.xcodeproj");
        assert_eq!(resolution.envs[2].value, "./android");
    }

    #[test]
    fn every_leaf_has_a_template() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", "{}");
        write(temp.path(), "android/build.gradle", "");
        ios_project(temp.path());

        let mut scanner = scanner();
        scanner.detect_platform(temp.path()).unwrap();
        let (tree, _) = scanner.options().unwrap();
        let configs = scanner.configs().unwrap();

        for id in tree.config_ids() {
            assert!(configs.contains_key(id), "missing {}", id);
        }
    }

    #[test]
    fn native_projects_outside_package_are_ignored() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "web/package.json", "{}");
        write(temp.path(), "android/build.gradle", "");

        let mut scanner = scanner();
        assert!(!scanner.detect_platform(temp.path()).unwrap());
    }

    #[test]
    fn plain_android_project_is_not_react_native() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "android/build.gradle", "");

        let mut scanner = scanner();
        assert!(!scanner.detect_platform(temp.path()).unwrap());
    }

    #[test]
    fn default_tree_branches_by_platform() {
        let tree = scanner().default_options().unwrap();

        let resolution = resolve(&tree, &mut Choose(IOS)).unwrap();
        assert_eq!(resolution.config_id, "default-reactnative-ios-config");
        assert_eq!(resolution.envs.len(), 2);

        let resolution = resolve(&tree, &mut Choose(ANDROID)).unwrap();
        assert_eq!(resolution.config_id, "default-reactnative-android-config");
        assert_eq!(resolution.envs[0].value, format!("typed {}", ANDROID_PATH_TITLE));
    }
}
