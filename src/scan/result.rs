//! Aggregated scan output.

use crate::error::{InitError, Result};
use crate::options::{resolve, AnswerSource, OptionTree, PlatformMap, Resolution};
use crate::pipeline::{compile, PipelineTemplate};
use crate::scanners::{ConfigMap, Warnings};

/// Option trees, templates and warnings of every reported platform.
///
/// Platforms are kept in the order they were inserted, which is the
/// detectors' registration order.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    trees: PlatformMap<OptionTree>,
    templates: PlatformMap<ConfigMap>,
    warnings: PlatformMap<Warnings>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a platform's tree and templates.
    pub fn insert(&mut self, platform: &str, tree: OptionTree, templates: ConfigMap) {
        self.trees.insert(platform, tree);
        self.templates.insert(platform, templates);
    }

    /// Append warnings to a platform, keeping earlier ones first.
    pub fn add_warnings(&mut self, platform: &str, warnings: Warnings) {
        if warnings.is_empty() {
            return;
        }
        match self.warnings.get_mut(platform) {
            Some(existing) => existing.extend(warnings),
            None => self.warnings.insert(platform, warnings),
        }
    }

    /// Platforms with a tree, in scan order.
    pub fn platforms(&self) -> Vec<&str> {
        self.trees.keys().collect()
    }

    pub fn tree(&self, platform: &str) -> Option<&OptionTree> {
        self.trees.get(platform)
    }

    pub fn templates(&self, platform: &str) -> Option<&ConfigMap> {
        self.templates.get(platform)
    }

    /// Warnings of one platform; empty when it has none.
    pub fn warnings(&self, platform: &str) -> &[String] {
        self.warnings.get(platform).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every platform's warnings, in the order they were first recorded.
    pub fn all_warnings(&self) -> impl Iterator<Item = (&str, &Warnings)> {
        self.warnings.iter()
    }

    /// True when no platform was recorded.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Check that every leaf names a template of its platform.
    pub fn validate(&self) -> Result<()> {
        for (platform, tree) in self.trees.iter() {
            let templates = self.templates.get(platform);
            for config_id in tree.config_ids() {
                if !templates.is_some_and(|t| t.contains_key(config_id)) {
                    return Err(InitError::TemplateMismatch {
                        platform: platform.to_string(),
                        config_id: config_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve a platform's tree with `answers`.
    pub fn resolve(&self, platform: &str, answers: &mut dyn AnswerSource) -> Result<Resolution> {
        let tree = self.tree(platform).ok_or_else(|| InitError::UnknownPlatform {
            name: platform.to_string(),
        })?;
        resolve(tree, answers)
    }

    /// Compile the pipeline a resolution selected.
    pub fn compile(&self, platform: &str, resolution: &Resolution) -> Result<PipelineTemplate> {
        let templates = self
            .templates(platform)
            .ok_or_else(|| InitError::UnknownPlatform {
                name: platform.to_string(),
            })?;
        compile(platform, &resolution.config_id, &resolution.envs, templates)
    }
}
