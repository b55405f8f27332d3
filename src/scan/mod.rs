//! Scan orchestration.
//!
//! [`Scanner`] runs every registered detector over a repository, drops
//! platforms made redundant by another detected platform, and collects the
//! survivors' option trees and templates into a [`ScanResult`]. When nothing
//! survives, the generic fallback is reported instead.

mod result;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::options::ScanDump;
use crate::pipeline::StepCatalog;
use crate::scanners::fs::FileList;
use crate::scanners::{self, PlatformCapability, Warnings};

pub use result::ScanResult;

/// Runs detectors in registration order.
pub struct Scanner {
    capabilities: Vec<Box<dyn PlatformCapability>>,
    fallback: Box<dyn PlatformCapability>,
}

impl Scanner {
    /// Scanner over the built-in detectors.
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self::with_capabilities(scanners::registered(&catalog), scanners::fallback(&catalog))
    }

    /// Scanner over custom detectors.
    pub fn with_capabilities(
        capabilities: Vec<Box<dyn PlatformCapability>>,
        fallback: Box<dyn PlatformCapability>,
    ) -> Self {
        Self {
            capabilities,
            fallback,
        }
    }

    /// Scan `root`.
    ///
    /// The repository is walked once and every detector inspects that
    /// listing. Detection runs for every detector before any exclusion is
    /// applied, so the result does not depend on which detector excludes
    /// which. An I/O error aborts the scan.
    pub fn scan(&mut self, root: &Path) -> Result<ScanResult> {
        tracing::info!(root = %root.display(), "Scanning repository");

        let files = FileList::walk(root)?;

        let mut detected = Vec::with_capacity(self.capabilities.len());
        for capability in self.capabilities.iter_mut() {
            let found = capability.detect_files(&files)?;
            tracing::debug!(platform = capability.name(), found, "Detection finished");
            detected.push(found);
        }

        let excluded: BTreeSet<String> = self
            .capabilities
            .iter()
            .zip(&detected)
            .filter(|(_, found)| **found)
            .flat_map(|(capability, _)| capability.excluded_platforms())
            .collect();

        let mut result = ScanResult::new();
        let mut reported = false;

        for (capability, found) in self.capabilities.iter().zip(&detected) {
            let name = capability.name();
            if excluded.contains(name) {
                if *found {
                    tracing::info!(
                        platform = name,
                        "Platform excluded by another detected platform"
                    );
                }
                continue;
            }

            result.add_warnings(name, capability.detection_warnings());

            if !*found {
                continue;
            }

            let (tree, warnings) = capability.options()?;
            let templates = capability.configs()?;
            result.insert(name, tree, templates);
            result.add_warnings(name, warnings);
            reported = true;

            tracing::info!(platform = name, "Platform detected");
        }

        if !reported {
            tracing::info!(platform = self.fallback.name(), "No platform detected, using fallback");
            let (tree, warnings) = self.fallback.options()?;
            result.insert(self.fallback.name(), tree, self.fallback.configs()?);
            result.add_warnings(self.fallback.name(), warnings);
        }

        result.validate()?;
        Ok(result)
    }

    /// Every detector's default trees and templates, without detecting.
    pub fn manual_config(&self) -> Result<ScanResult> {
        let mut result = ScanResult::new();

        for capability in self.capabilities.iter().chain(std::iter::once(&self.fallback)) {
            result.insert(
                capability.name(),
                capability.default_options()?,
                capability.default_configs()?,
            );
        }

        result.validate()?;
        Ok(result)
    }

    /// Exhaustive dump of [`manual_config`](Self::manual_config).
    pub fn manual_dump(&self) -> Result<ScanDump> {
        Ok(ScanDump::from_result(&self.manual_config()?))
    }
}

/// Warnings of a platform joined for display.
pub fn format_warnings(platform: &str, warnings: &Warnings) -> Vec<String> {
    warnings
        .iter()
        .map(|w| format!("{}: {}", platform, w))
        .collect()
}
