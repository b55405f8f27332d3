//! Step catalog embedded at compile time.

use std::collections::BTreeMap;

use include_dir::{include_dir, Dir};
use serde::Deserialize;

use crate::error::{InitError, Result};

use super::StepListItem;

/// Embedded catalog directory.
static CATALOG_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/catalog");

pub const ACTIVATE_SSH_KEY: &str = "activate-ssh-key";
pub const GIT_CLONE: &str = "git-clone";
pub const SCRIPT: &str = "script";
pub const INSTALL_MISSING_ANDROID_TOOLS: &str = "install-missing-android-tools";
pub const GRADLE_RUNNER: &str = "gradle-runner";
pub const CERTIFICATE_AND_PROFILE_INSTALLER: &str = "certificate-and-profile-installer";
pub const RECREATE_USER_SCHEMES: &str = "recreate-user-schemes";
pub const COCOAPODS_INSTALL: &str = "cocoapods-install";
pub const XCODE_TEST: &str = "xcode-test";
pub const XCODE_ARCHIVE: &str = "xcode-archive";
pub const XCODE_TEST_MAC: &str = "xcode-test-mac";
pub const XCODE_ARCHIVE_MAC: &str = "xcode-archive-mac";
pub const FASTLANE: &str = "fastlane";
pub const GENERATE_CORDOVA_BUILD_CONFIGURATION: &str = "generate-cordova-build-configuration";
pub const CORDOVA_ARCHIVE: &str = "cordova-archive";
pub const XAMARIN_USER_MANAGEMENT: &str = "xamarin-user-management";
pub const NUGET_RESTORE: &str = "nuget-restore";
pub const XAMARIN_COMPONENTS_RESTORE: &str = "xamarin-components-restore";
pub const XAMARIN_ARCHIVE: &str = "xamarin-archive";
pub const DEPLOY_TO_BITRISE_IO: &str = "deploy-to-bitrise-io";

/// Format version, step library and pinned step versions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepCatalog {
    pub format_version: String,
    pub default_step_lib_source: String,
    steps: BTreeMap<String, String>,
}

impl StepCatalog {
    /// Load the catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let file = CATALOG_DIR
            .get_file("steps.yml")
            .ok_or_else(|| InitError::CatalogError {
                message: "catalog/steps.yml is missing".to_string(),
            })?;

        let content = file.contents_utf8().ok_or_else(|| InitError::CatalogError {
            message: "catalog/steps.yml is not valid UTF-8".to_string(),
        })?;

        Self::from_yaml(content)
    }

    /// Parse catalog text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| InitError::CatalogError {
            message: e.to_string(),
        })
    }

    /// Pinned version of a step.
    pub fn version(&self, id: &str) -> Result<&str> {
        self.steps
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| InitError::CatalogError {
                message: format!("unknown step '{}'", id),
            })
    }

    /// A bare invocation of a step at its pinned version.
    pub fn step(&self, id: &str) -> Result<StepListItem> {
        Ok(StepListItem::new(id, Some(self.version(id)?)))
    }

    /// Known step ids, sorted.
    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.keys().map(String::as_str)
    }
}
