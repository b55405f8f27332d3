//! Turns a resolved configuration into a pipeline document.

use crate::error::{InitError, Result};
use crate::scanners::ConfigMap;

use super::{EnvAssignment, PipelineTemplate};

/// Compile template `config_id` of `platform` with the collected `envs`.
///
/// The template text is parsed strictly and `envs` are appended to the
/// app-level environment in the order given. Duplicate keys are kept.
pub fn compile(
    platform: &str,
    config_id: &str,
    envs: &[EnvAssignment],
    templates: &ConfigMap,
) -> Result<PipelineTemplate> {
    let text = templates
        .get(config_id)
        .ok_or_else(|| InitError::UnknownConfiguration {
            platform: platform.to_string(),
            config_id: config_id.to_string(),
        })?;

    let mut pipeline = PipelineTemplate::from_yaml(text)?;
    pipeline.app.envs.extend(envs.iter().cloned());

    tracing::debug!(
        platform,
        config_id,
        envs = envs.len(),
        "Compiled pipeline"
    );

    Ok(pipeline)
}
