//! Platform detectors.
//!
//! Each detector implements [`PlatformCapability`]: it inspects a repository,
//! and when it recognises its platform it describes the questions to ask
//! (an [`OptionTree`]) and the pipeline templates the answers lead to.

pub mod android;
pub mod cordova;
pub mod fastlane;
pub mod fs;
pub mod other;
pub mod reactnative;
pub mod xamarin;
pub mod xcode;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::options::OptionTree;
use crate::pipeline::StepCatalog;

use fs::FileList;

pub use android::AndroidScanner;
pub use cordova::CordovaScanner;
pub use fastlane::FastlaneScanner;
pub use other::OtherScanner;
pub use reactnative::ReactNativeScanner;
pub use xamarin::XamarinScanner;
pub use xcode::{XcodePlatform, XcodeScanner};

/// Configuration id → pipeline template text.
pub type ConfigMap = BTreeMap<String, String>;

/// Non-fatal findings, in the order they were made.
pub type Warnings = Vec<String>;

/// A build platform detector.
pub trait PlatformCapability {
    /// Platform name used as key in scan results.
    fn name(&self) -> &str;

    /// Inspect `root` and remember what was found.
    ///
    /// Re-running resets any previous state. Fails only on I/O errors.
    fn detect_platform(&mut self, root: &Path) -> Result<bool> {
        self.detect_files(&FileList::walk(root)?)
    }

    /// Detect from a listing walked once and shared by every detector.
    fn detect_files(&mut self, files: &FileList) -> Result<bool>;

    /// Questions for the detected projects.
    fn options(&self) -> Result<(OptionTree, Warnings)>;

    /// Questions used when nothing was detected.
    fn default_options(&self) -> Result<OptionTree>;

    /// Templates for the detected projects.
    fn configs(&self) -> Result<ConfigMap>;

    /// Templates referenced by [`default_options`](Self::default_options).
    fn default_configs(&self) -> Result<ConfigMap>;

    /// Platforms made redundant when this one is detected.
    fn excluded_platforms(&self) -> Vec<String> {
        Vec::new()
    }

    /// Findings made while detecting, reported even when not detected.
    fn detection_warnings(&self) -> Warnings {
        Warnings::new()
    }
}

/// Detectors in registration order.
pub fn registered(catalog: &Arc<StepCatalog>) -> Vec<Box<dyn PlatformCapability>> {
    vec![
        Box::new(ReactNativeScanner::new(Arc::clone(catalog))),
        Box::new(CordovaScanner::new(Arc::clone(catalog))),
        Box::new(XcodeScanner::new(XcodePlatform::Ios, Arc::clone(catalog))),
        Box::new(XcodeScanner::new(XcodePlatform::MacOs, Arc::clone(catalog))),
        Box::new(AndroidScanner::new(Arc::clone(catalog))),
        Box::new(XamarinScanner::new(Arc::clone(catalog))),
        Box::new(FastlaneScanner::new(Arc::clone(catalog))),
    ]
}

/// Capability used when no detector matched.
pub fn fallback(catalog: &Arc<StepCatalog>) -> Box<dyn PlatformCapability> {
    Box::new(OtherScanner::new(Arc::clone(catalog)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<StepCatalog> {
        Arc::new(StepCatalog::builtin().unwrap())
    }

    #[test]
    fn registration_order() {
        let names: Vec<_> = registered(&catalog())
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["reactnative", "cordova", "ios", "macos", "android", "xamarin", "fastlane"]
        );
    }

    #[test]
    fn fallback_is_other() {
        assert_eq!(fallback(&catalog()).name(), "other");
    }

    #[test]
    fn default_trees_reference_default_templates() {
        let catalog = catalog();
        let mut capabilities = registered(&catalog);
        capabilities.push(fallback(&catalog));

        for capability in &capabilities {
            let tree = capability.default_options().unwrap();
            let templates = capability.default_configs().unwrap();
            for id in tree.config_ids() {
                assert!(
                    templates.contains_key(id),
                    "{}: default tree references missing '{}'",
                    capability.name(),
                    id
                );
            }
        }
    }

    #[test]
    fn default_templates_parse() {
        let catalog = catalog();
        let mut capabilities = registered(&catalog);
        capabilities.push(fallback(&catalog));

        for capability in &capabilities {
            for (id, text) in capability.default_configs().unwrap() {
                let template = crate::pipeline::PipelineTemplate::from_yaml(&text)
                    .unwrap_or_else(|e| panic!("{} {}: {}", capability.name(), id, e));
                assert!(template.workflow("primary").is_some());
            }
        }
    }

    #[test]
    fn only_reactnative_excludes() {
        for capability in registered(&catalog()) {
            let excluded = capability.excluded_platforms();
            if capability.name() == "reactnative" {
                assert_eq!(excluded, vec!["android", "ios"]);
            } else {
                assert!(excluded.is_empty(), "{} excludes {:?}", capability.name(), excluded);
            }
        }
    }
}
