//! Fastlane setups.

use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::{InitError, Result};
use crate::options::{OptionTree, PLACEHOLDER};
use crate::pipeline::builder::{PipelineBuilder, PRIMARY_WORKFLOW};
use crate::pipeline::catalog;
use crate::pipeline::StepCatalog;

use super::fs::{display_path, FileList};
use super::{ConfigMap, PlatformCapability, Warnings};

const NAME: &str = "fastlane";

const CONFIG_ID: &str = "fastlane-config";
const DEFAULT_CONFIG_ID: &str = "default-fastlane-config";

pub const WORK_DIR_TITLE: &str = "Working directory";
pub const WORK_DIR_KEY: &str = "FASTLANE_WORK_DIR";
pub const LANE_TITLE: &str = "Fastlane lane";
pub const LANE_KEY: &str = "FASTLANE_LANE";

static PLATFORM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*platform\s+:(\w+)\s+do\b").expect("PLATFORM_REGEX must compile")
});

static LANE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*lane\s+:(\w+)\s+do\b").expect("LANE_REGEX must compile")
});

/// `do` blocks, with or without block arguments.
static DO_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bdo\b(\s*\|[^|]*\|)?\s*$").expect("DO_BLOCK_REGEX must compile")
});

/// Keywords opening a block when they start a statement, possibly as the
/// value of an assignment. The modifier form (`retry if failed`) opens
/// nothing.
static KEYWORD_BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:[@\w.]+\s*(?:\|\||&&)?=\s*)?(if|unless|while|until|case|begin|def|class|module)\b",
    )
    .expect("KEYWORD_BLOCK_REGEX must compile")
});

static END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*end\b").expect("END_REGEX must compile"));

/// Blocks closed on the line that opened them, like `def ready?; true; end`.
static INLINE_END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;\s]end\s*$").expect("INLINE_END_REGEX must compile"));

/// A Fastfile directory and the lanes declared there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fastfile {
    /// Display path of the directory fastlane runs in.
    pub work_dir: String,
    /// Lanes as `platform lane` or `lane`, first declaration first.
    pub lanes: Vec<String>,
}

impl Fastfile {
    fn add_lanes(&mut self, lanes: Vec<String>) {
        for lane in lanes {
            if !self.lanes.contains(&lane) {
                self.lanes.push(lane);
            }
        }
    }
}

/// Parse public lanes from Fastfile text.
///
/// Lanes inside a `platform :x do` block are prefixed with the platform
/// name. Private lanes are skipped and a lane declared twice is listed once.
pub fn parse_lanes(content: &str) -> Vec<String> {
    let mut lanes: Vec<String> = Vec::new();
    let mut platform: Option<(String, usize)> = None;
    let mut depth = 0usize;

    for line in content.lines() {
        if line.trim_start().starts_with('#') {
            continue;
        }

        if let Some(caps) = PLATFORM_REGEX.captures(line) {
            platform = Some((caps[1].to_string(), depth));
        } else if let Some(caps) = LANE_REGEX.captures(line) {
            let lane = match &platform {
                Some((name, _)) => format!("{} {}", name, &caps[1]),
                None => caps[1].to_string(),
            };
            if !lanes.contains(&lane) {
                lanes.push(lane);
            }
        }

        let opens = DO_BLOCK_REGEX.is_match(line) || KEYWORD_BLOCK_REGEX.is_match(line);
        if opens {
            if !INLINE_END_REGEX.is_match(line) {
                depth += 1;
            }
        } else if END_REGEX.is_match(line) {
            depth = depth.saturating_sub(1);
            if matches!(&platform, Some((_, opened)) if *opened == depth) {
                platform = None;
            }
        }
    }

    lanes
}

/// Detects `Fastfile`s.
pub struct FastlaneScanner {
    catalog: Arc<StepCatalog>,
    fastfiles: Vec<Fastfile>,
}

impl FastlaneScanner {
    /// Create a scanner.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self {
            catalog,
            fastfiles: Vec::new(),
        }
    }

    /// Fastfile directories found by the last detection.
    pub fn fastfiles(&self) -> &[Fastfile] {
        &self.fastfiles
    }

    fn template(&self) -> Result<String> {
        let builder = PipelineBuilder::new(&self.catalog, NAME)
            .app_env("FASTLANE_XCODE_LIST_TIMEOUT", "120");
        let mut steps = builder.prepare_steps()?;
        steps.push(builder.step(catalog::CERTIFICATE_AND_PROFILE_INSTALLER)?);
        steps.push(
            builder
                .step(catalog::FASTLANE)?
                .with_input("lane", "$FASTLANE_LANE")
                .with_input("work_dir", "$FASTLANE_WORK_DIR"),
        );
        builder.workflow(PRIMARY_WORKFLOW, steps)?.render()
    }
}

impl PlatformCapability for FastlaneScanner {
    fn name(&self) -> &str {
        NAME
    }

    fn detect_files(&mut self, files: &FileList) -> Result<bool> {
        self.fastfiles.clear();

        tracing::info!("Searching for Fastfile");

        for entry in files.named("Fastfile") {
            let dir = entry.relative_dir();
            let work_dir = if dir.file_name().and_then(|n| n.to_str()) == Some("fastlane") {
                display_path(dir.parent().unwrap_or_else(|| Path::new("")))
            } else {
                display_path(dir)
            };

            let lanes = parse_lanes(&files.read(entry)?);
            tracing::debug!(fastfile = %entry.display(), lanes = lanes.len(), "Found Fastfile");

            // `./Fastfile` and `./fastlane/Fastfile` both run in `./`.
            match self.fastfiles.iter_mut().find(|f| f.work_dir == work_dir) {
                Some(existing) => existing.add_lanes(lanes),
                None => {
                    let mut fastfile = Fastfile {
                        work_dir,
                        lanes: Vec::new(),
                    };
                    fastfile.add_lanes(lanes);
                    self.fastfiles.push(fastfile);
                }
            }
        }

        Ok(!self.fastfiles.is_empty())
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        let mut warnings = Warnings::new();
        let mut b = OptionTree::builder();
        let leaf = b.leaf(CONFIG_ID);

        let mut work_dirs = Vec::new();
        for fastfile in &self.fastfiles {
            let lanes = if fastfile.lanes.is_empty() {
                warnings.push(format!("No lanes found in Fastfile of {}", fastfile.work_dir));
                vec![PLACEHOLDER.to_string()]
            } else {
                fastfile.lanes.clone()
            };
            let lane = b.question(
                LANE_TITLE,
                Some(LANE_KEY),
                lanes.into_iter().map(|l| (l, leaf)),
            )?;
            work_dirs.push((fastfile.work_dir.clone(), lane));
        }

        if work_dirs.is_empty() {
            return Err(InitError::InvalidTree {
                message: "no Fastfile detected".to_string(),
            });
        }

        let root = b.question(WORK_DIR_TITLE, Some(WORK_DIR_KEY), work_dirs)?;
        Ok((b.build(root)?, warnings))
    }

    fn default_options(&self) -> Result<OptionTree> {
        let mut b = OptionTree::builder();
        let leaf = b.leaf(DEFAULT_CONFIG_ID);
        let lane = b.input(LANE_TITLE, LANE_KEY, leaf)?;
        let work_dir = b.input(WORK_DIR_TITLE, WORK_DIR_KEY, lane)?;
        b.build(work_dir)
    }

    fn configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(CONFIG_ID.to_string(), self.template()?)]))
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        Ok(ConfigMap::from([(DEFAULT_CONFIG_ID.to_string(), self.template()?)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{EnvAssignment, PipelineTemplate};
    use std::fs;
    use tempfile::TempDir;

    const FASTFILE: &str = r#"
fastlane_version "2.0.0"
default_platform :ios

platform :ios do
  before_all do
    cocoapods
  end

  lane :test do
    scan
  end

  private_lane :build_number do |options|
    increment_build_number
  end

  lane :beta do
    gym
  end
end

platform :android do
  lane :deploy do
    gradle(task: "assembleRelease")
  end
end

lane :lint do
  swiftlint
end
"#;

    fn scanner() -> FastlaneScanner {
        FastlaneScanner::new(Arc::new(StepCatalog::builtin().unwrap()))
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn lanes_are_prefixed_with_platform() {
        let lanes = parse_lanes(FASTFILE);
        assert_eq!(lanes, vec!["ios test", "ios beta", "android deploy", "lint"]);
    }

    #[test]
    fn conditionals_keep_platform_scope() {
        let fastfile = r#"
platform :ios do
  lane :beta do
    if is_ci
      setup_ci
    end
    unless ENV["SKIP_TESTS"]
      scan
    end
    build = begin
      gym
    end
    increment_build_number if is_ci
  end

  def helper; true; end

  lane :release do
    case ENV["TRACK"]
    when "beta"
      pilot
    end
  end
end

lane :lint do
end
"#;

        assert_eq!(parse_lanes(fastfile), vec!["ios beta", "ios release", "lint"]);
    }

    #[test]
    fn repeated_lane_is_listed_once() {
        let fastfile = "lane :beta do\nend\nlane :beta do\nend\n";
        assert_eq!(parse_lanes(fastfile), vec!["beta"]);
    }

    #[test]
    fn fastfiles_sharing_a_work_dir_are_merged() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Fastfile", "lane :lint do\nend\nlane :beta do\nend\n");
        write(temp.path(), "fastlane/Fastfile", "lane :beta do\nend\nlane :release do\nend\n");

        let mut scanner = scanner();
        assert!(scanner.detect_platform(temp.path()).unwrap());

        assert_eq!(
            scanner.fastfiles(),
            [Fastfile {
                work_dir: "./".to_string(),
                lanes: vec!["lint".to_string(), "beta".to_string(), "release".to_string()],
            }]
        );
        let (tree, warnings) = scanner.options().unwrap();
        assert!(warnings.is_empty());
        let root = tree.question(tree.root()).unwrap();
        assert_eq!(root.answers(), vec!["./"]);
    }

    #[test]
    fn work_dir_is_parent_of_fastlane_dir() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "mobile/fastlane/Fastfile", FASTFILE);

        let mut scanner = scanner();
        assert!(scanner.detect_platform(temp.path()).unwrap());

        assert_eq!(scanner.fastfiles()[0].work_dir, "./mobile");
    }

    #[test]
    fn root_fastlane_dir_works_in_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "fastlane/Fastfile", FASTFILE);

        let mut scanner = scanner();
        scanner.detect_platform(temp.path()).unwrap();

        assert_eq!(scanner.fastfiles()[0].work_dir, "./");
    }

    #[test]
    fn empty_fastfile_warns() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "fastlane/Fastfile", "# nothing yet\n");

        let mut scanner = scanner();
        scanner.detect_platform(temp.path()).unwrap();
        let (tree, warnings) = scanner.options().unwrap();

        assert_eq!(warnings.len(), 1);
        let root = tree.question(tree.root()).unwrap();
        let (_, lane) = root.sole_child().unwrap();
        assert!(tree.question(lane).unwrap().is_placeholder());
    }

    #[test]
    fn template_sets_xcode_list_timeout() {
        let text = &scanner().default_configs().unwrap()[DEFAULT_CONFIG_ID];
        let template = PipelineTemplate::from_yaml(text).unwrap();

        assert_eq!(
            template.app.envs,
            vec![EnvAssignment::new("FASTLANE_XCODE_LIST_TIMEOUT", "120")]
        );
        assert!(
            text.contains("FASTLANE_XCODE_LIST_TIMEOUT: '120'")
                || text.contains("FASTLANE_XCODE_LIST_TIMEOUT: \"120\"")
        );
    }

    #[test]
    fn no_fastfile() {
        let temp = TempDir::new().unwrap();
        let mut scanner = scanner();
        assert!(!scanner.detect_platform(temp.path()).unwrap());
    }
}
