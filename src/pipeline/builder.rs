//! Typed construction of pipeline templates.
//!
//! Scanners describe their templates with [`PipelineBuilder`] rather than
//! hand-written YAML, so every generated pipeline shares the same prefix,
//! trigger map and step versions.

use std::collections::BTreeMap;

use crate::error::Result;

use super::catalog::{self, StepCatalog};
use super::{App, EnvAssignment, PipelineTemplate, StepListItem, TriggerItem, Workflow};

/// Workflow run on every push and pull request.
pub const PRIMARY_WORKFLOW: &str = "primary";

/// Workflow that also archives the app.
pub const DEPLOY_WORKFLOW: &str = "deploy";

/// Guard that skips key activation when no key is configured.
pub const SSH_KEY_RUN_IF: &str = r#"{{getenv "SSH_RSA_PRIVATE_KEY" | ne ""}}"#;

/// Guard for steps that only make sense on a CI machine.
pub const CI_RUN_IF: &str = ".IsCI";

const SCRIPT_TITLE: &str = "Do anything with Script step";

/// Builds one [`PipelineTemplate`] from catalog steps.
pub struct PipelineBuilder<'a> {
    catalog: &'a StepCatalog,
    project_type: String,
    envs: Vec<EnvAssignment>,
    workflows: BTreeMap<String, Workflow>,
}

impl<'a> PipelineBuilder<'a> {
    /// Start a template for `project_type`.
    pub fn new(catalog: &'a StepCatalog, project_type: &str) -> Self {
        Self {
            catalog,
            project_type: project_type.to_string(),
            envs: Vec::new(),
            workflows: BTreeMap::new(),
        }
    }

    /// A bare catalog step.
    pub fn step(&self, id: &str) -> Result<StepListItem> {
        self.catalog.step(id)
    }

    /// Key activation and checkout.
    pub fn checkout_steps(&self) -> Result<Vec<StepListItem>> {
        Ok(vec![
            self.step(catalog::ACTIVATE_SSH_KEY)?.with_run_if(SSH_KEY_RUN_IF),
            self.step(catalog::GIT_CLONE)?,
        ])
    }

    /// Checkout followed by the placeholder script step.
    pub fn prepare_steps(&self) -> Result<Vec<StepListItem>> {
        let mut steps = self.checkout_steps()?;
        steps.push(self.step(catalog::SCRIPT)?.with_title(SCRIPT_TITLE));
        Ok(steps)
    }

    /// A script step running `content`.
    pub fn script(&self, title: &str, content: &str) -> Result<StepListItem> {
        Ok(self
            .step(catalog::SCRIPT)?
            .with_title(title)
            .with_input("content", content))
    }

    /// Add an app-level environment assignment.
    pub fn app_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push(EnvAssignment::new(key, value));
        self
    }

    /// Add a workflow; the deploy step is appended.
    pub fn workflow(mut self, name: &str, mut steps: Vec<StepListItem>) -> Result<Self> {
        steps.push(self.step(catalog::DEPLOY_TO_BITRISE_IO)?);
        self.workflows.insert(name.to_string(), Workflow { steps });
        Ok(self)
    }

    /// Finish the template with the standard trigger map.
    pub fn build(self) -> PipelineTemplate {
        PipelineTemplate {
            format_version: self.catalog.format_version.clone(),
            default_step_lib_source: self.catalog.default_step_lib_source.clone(),
            project_type: self.project_type,
            app: App { envs: self.envs },
            trigger_map: vec![
                TriggerItem::push("*", PRIMARY_WORKFLOW),
                TriggerItem::pull_request("*", PRIMARY_WORKFLOW),
            ],
            workflows: self.workflows,
        }
    }

    /// Finish and render as template text.
    pub fn render(self) -> Result<String> {
        self.build().to_yaml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StepCatalog {
        StepCatalog::builtin().unwrap()
    }

    #[test]
    fn prepare_steps_are_ssh_clone_script() {
        let catalog = catalog();
        let builder = PipelineBuilder::new(&catalog, "other");

        let steps = builder.prepare_steps().unwrap();

        let ids: Vec<_> = steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["activate-ssh-key", "git-clone", "script"]);
        assert_eq!(steps[0].step.run_if.as_deref(), Some(SSH_KEY_RUN_IF));
        assert_eq!(steps[2].step.title.as_deref(), Some(SCRIPT_TITLE));
    }

    #[test]
    fn workflow_ends_with_deploy() {
        let catalog = catalog();
        let builder = PipelineBuilder::new(&catalog, "other");
        let steps = builder.prepare_steps().unwrap();

        let template = builder.workflow(PRIMARY_WORKFLOW, steps).unwrap().build();

        let ids = template.workflow(PRIMARY_WORKFLOW).unwrap().step_ids();
        assert_eq!(ids.last(), Some(&"deploy-to-bitrise-io"));
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn standard_trigger_map() {
        let catalog = catalog();
        let template = PipelineBuilder::new(&catalog, "android").build();

        assert_eq!(
            template.trigger_map,
            vec![
                TriggerItem::push("*", PRIMARY_WORKFLOW),
                TriggerItem::pull_request("*", PRIMARY_WORKFLOW),
            ]
        );
        assert_eq!(template.format_version, "1.3.1");
    }

    #[test]
    fn app_envs_keep_order() {
        let catalog = catalog();
        let template = PipelineBuilder::new(&catalog, "fastlane")
            .app_env("FASTLANE_XCODE_LIST_TIMEOUT", "120")
            .app_env("OTHER", "1")
            .build();

        assert_eq!(template.app.envs[0], EnvAssignment::new("FASTLANE_XCODE_LIST_TIMEOUT", "120"));
        assert_eq!(template.app.envs.len(), 2);
    }

    #[test]
    fn rendered_template_parses_back() {
        let catalog = catalog();
        let builder = PipelineBuilder::new(&catalog, "other");
        let steps = builder.prepare_steps().unwrap();
        let text = builder
            .workflow(PRIMARY_WORKFLOW, steps)
            .unwrap()
            .render()
            .unwrap();

        let parsed = PipelineTemplate::from_yaml(&text).unwrap();
        assert_eq!(parsed.project_type, "other");
        assert!(text.contains("activate-ssh-key@3.1.1"));
    }

    #[test]
    fn script_step_carries_content() {
        let catalog = catalog();
        let builder = PipelineBuilder::new(&catalog, "react-native");
        let step = builder.script("Install npm packages", "npm install").unwrap();
        assert_eq!(step.step.inputs, vec![EnvAssignment::new("content", "npm install")]);
    }
}
