//! Generic pipeline for repositories no detector recognises.

use std::sync::Arc;

use crate::error::Result;
use crate::options::OptionTree;
use crate::pipeline::builder::{PipelineBuilder, PRIMARY_WORKFLOW};
use crate::pipeline::StepCatalog;

use super::fs::FileList;
use super::{ConfigMap, PlatformCapability, Warnings};

const NAME: &str = "other";

pub const CONFIG_ID: &str = "other-config";

/// The fallback capability. Never detects anything by itself.
pub struct OtherScanner {
    catalog: Arc<StepCatalog>,
}

impl OtherScanner {
    pub fn new(catalog: Arc<StepCatalog>) -> Self {
        Self { catalog }
    }
}

impl PlatformCapability for OtherScanner {
    fn name(&self) -> &str {
        NAME
    }

    fn detect_files(&mut self, _files: &FileList) -> Result<bool> {
        Ok(false)
    }

    fn options(&self) -> Result<(OptionTree, Warnings)> {
        Ok((self.default_options()?, Warnings::new()))
    }

    fn default_options(&self) -> Result<OptionTree> {
        Ok(OptionTree::single(CONFIG_ID))
    }

    fn configs(&self) -> Result<ConfigMap> {
        self.default_configs()
    }

    fn default_configs(&self) -> Result<ConfigMap> {
        let builder = PipelineBuilder::new(&self.catalog, NAME);
        let steps = builder.prepare_steps()?;
        let text = builder.workflow(PRIMARY_WORKFLOW, steps)?.render()?;
        Ok(ConfigMap::from([(CONFIG_ID.to_string(), text)]))
    }
}
