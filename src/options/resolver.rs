//! Interactive resolution of an option tree.
//!
//! [`resolve`] walks one tree from its root, asking an [`AnswerSource`]
//! only where a real choice exists, and returns the selected configuration
//! together with the environment assignments gathered on the way.

use crate::error::{InitError, Result};
use crate::pipeline::EnvAssignment;
use crate::ui::{Prompt, PromptOption, PromptType, UserInterface};

use super::{OptionNode, OptionTree, Question};

/// Where answers come from.
pub trait AnswerSource {
    /// Ask for a free-text value.
    fn provide(&mut self, question: &Question) -> Result<String>;

    /// Ask for one of `answers`.
    fn choose(&mut self, question: &Question, answers: &[&str]) -> Result<String>;
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Selected configuration id.
    pub config_id: String,
    /// Assignments in the order the questions were visited.
    pub envs: Vec<EnvAssignment>,
}

/// Resolve `tree` into a configuration id and environment assignments.
///
/// A question with a single answer is auto-selected, unless that answer is
/// the placeholder, in which case free text is requested. A question with a
/// single child always descends into it, even when the answer given is not a
/// literal key. With several children the answer must match one of them,
/// otherwise the result is [`InitError::NoConfigSelected`].
pub fn resolve(tree: &OptionTree, answers: &mut dyn AnswerSource) -> Result<Resolution> {
    let mut envs = Vec::new();
    let mut current = tree.root();

    // Children always precede their parent in the arena, so this terminates.
    loop {
        let question = match tree.node(current) {
            OptionNode::Config(leaf) => {
                return Ok(Resolution {
                    config_id: leaf.config_id.clone(),
                    envs,
                });
            }
            OptionNode::Question(question) => question,
        };

        let selected = select_answer(question, answers)?;
        tracing::debug!(title = %question.title, answer = %selected, "Answered question");

        if let Some(key) = &question.env_key {
            envs.push(EnvAssignment::new(key, &selected));
        }

        current = match question.sole_child() {
            Some((_, child)) => child,
            None => question
                .child(&selected)
                .ok_or(InitError::NoConfigSelected)?,
        };
    }
}

fn select_answer(question: &Question, answers: &mut dyn AnswerSource) -> Result<String> {
    if question.is_placeholder() {
        return answers.provide(question);
    }
    if let Some((only, _)) = question.sole_child() {
        return Ok(only.to_string());
    }
    answers.choose(question, &question.answers())
}

/// Answers questions through a [`UserInterface`].
///
/// Prompts are keyed by the question's environment key, or by a slug of its
/// title for unbound questions, so scripted and non-interactive answers can
/// target them.
pub struct PromptAnswers<'a> {
    ui: &'a mut dyn UserInterface,
}

impl<'a> PromptAnswers<'a> {
    /// Wrap a user interface.
    pub fn new(ui: &'a mut dyn UserInterface) -> Self {
        Self { ui }
    }
}

/// Prompt key used for a question.
pub fn prompt_key(question: &Question) -> String {
    match &question.env_key {
        Some(key) => key.clone(),
        None => question
            .title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect(),
    }
}

impl AnswerSource for PromptAnswers<'_> {
    fn provide(&mut self, question: &Question) -> Result<String> {
        let prompt = Prompt {
            key: prompt_key(question),
            question: format!("Provide: {}", question.title),
            prompt_type: PromptType::Input,
            default: None,
        };
        Ok(self.ui.prompt(&prompt)?.as_string())
    }

    fn choose(&mut self, question: &Question, answers: &[&str]) -> Result<String> {
        let options = answers
            .iter()
            .map(|a| PromptOption {
                label: a.to_string(),
                value: a.to_string(),
            })
            .collect();
        let prompt = Prompt {
            key: prompt_key(question),
            question: format!("Select: {}", question.title),
            prompt_type: PromptType::Select { options },
            default: answers.first().map(|a| a.to_string()),
        };
        Ok(self.ui.prompt(&prompt)?.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::PLACEHOLDER;
    use crate::ui::MockUI;
    use std::collections::VecDeque;

    /// Replays a fixed answer sequence and counts how often it was asked.
    #[derive(Default)]
    struct Scripted {
        answers: VecDeque<String>,
        asked: usize,
    }

    impl Scripted {
        fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                asked: 0,
            }
        }

        fn next(&mut self) -> Result<String> {
            self.asked += 1;
            self.answers
                .pop_front()
                .ok_or_else(|| InitError::Other(anyhow::anyhow!("answer source exhausted")))
        }
    }

    impl AnswerSource for Scripted {
        fn provide(&mut self, _question: &Question) -> Result<String> {
            self.next()
        }

        fn choose(&mut self, _question: &Question, _answers: &[&str]) -> Result<String> {
            self.next()
        }
    }

    fn platform_tree() -> OptionTree {
        let mut b = OptionTree::builder();
        let ios_leaf = b.leaf("ios-config");
        let android_leaf = b.leaf("android-config");
        let gradle = b
            .question(
                "Gradle task to run",
                Some("GRADLE_TASK"),
                [("assemble", android_leaf), ("assembleRelease", android_leaf)],
            )
            .unwrap();
        let root = b
            .question(
                "Build platform",
                Some("PLATFORM"),
                [("iOS", ios_leaf), ("Android", gradle)],
            )
            .unwrap();
        b.build(root).unwrap()
    }

    fn xcode_default_tree() -> OptionTree {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("default-ios-config");
        let scheme = b.input("Scheme name", "BITRISE_SCHEME", leaf).unwrap();
        let project = b
            .input("Project (or Workspace) path", "BITRISE_PROJECT_PATH", scheme)
            .unwrap();
        b.build(project).unwrap()
    }

    #[test]
    fn leaf_root_resolves_without_asking() {
        let tree = OptionTree::single("other-config");
        let mut source = Scripted::new(&[]);

        let resolution = resolve(&tree, &mut source).unwrap();

        assert_eq!(resolution.config_id, "other-config");
        assert!(resolution.envs.is_empty());
        assert_eq!(source.asked, 0);
    }

    #[test]
    fn choosing_ios_skips_android_branch() {
        let tree = platform_tree();
        let mut source = Scripted::new(&["iOS"]);

        let resolution = resolve(&tree, &mut source).unwrap();

        assert_eq!(resolution.config_id, "ios-config");
        assert_eq!(resolution.envs, vec![EnvAssignment::new("PLATFORM", "iOS")]);
        assert!(resolution.envs.iter().all(|e| e.key != "GRADLE_TASK"));
    }

    #[test]
    fn placeholder_answers_become_assignments() {
        let tree = xcode_default_tree();
        let mut source = Scripted::new(&["./App.xcworkspace", "App"]);

        let resolution = resolve(&tree, &mut source).unwrap();

        assert_eq!(resolution.config_id, "default-ios-config");
        assert_eq!(
            resolution.envs,
            vec![
                EnvAssignment::new("BITRISE_PROJECT_PATH", "./App.xcworkspace"),
                EnvAssignment::new("BITRISE_SCHEME", "App"),
            ]
        );
    }

    #[test]
    fn single_fixed_answer_is_auto_selected() {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("android-config");
        let root = b
            .question("Gradlew file path", Some("GRADLEW_PATH"), [("./gradlew", leaf)])
            .unwrap();
        let tree = b.build(root).unwrap();
        let mut source = Scripted::new(&["something-else"]);

        let resolution = resolve(&tree, &mut source).unwrap();

        assert_eq!(source.asked, 0);
        assert_eq!(
            resolution.envs,
            vec![EnvAssignment::new("GRADLEW_PATH", "./gradlew")]
        );
    }

    #[test]
    fn single_child_is_descended_for_any_placeholder_answer() {
        let tree = xcode_default_tree();
        // Neither answer equals the literal "_" key.
        let mut source = Scripted::new(&["not-a-key", "also-not-a-key"]);

        let resolution = resolve(&tree, &mut source).unwrap();

        assert_eq!(resolution.config_id, "default-ios-config");
        assert_eq!(resolution.envs[0].value, "not-a-key");
    }

    #[test]
    fn unbound_question_records_nothing() {
        let mut b = OptionTree::builder();
        let a = b.leaf("a-config");
        let c = b.leaf("b-config");
        let root = b.question("Task", None, [("A", a), ("B", c)]).unwrap();
        let tree = b.build(root).unwrap();
        let mut source = Scripted::new(&["B"]);

        let resolution = resolve(&tree, &mut source).unwrap();

        assert_eq!(resolution.config_id, "b-config");
        assert!(resolution.envs.is_empty());
    }

    #[test]
    fn unknown_choice_is_a_dead_end() {
        let tree = platform_tree();
        let mut source = Scripted::new(&["Windows Phone"]);

        let result = resolve(&tree, &mut source);

        assert!(matches!(result, Err(InitError::NoConfigSelected)));
    }

    #[test]
    fn answer_source_failure_propagates() {
        let tree = platform_tree();
        let mut source = Scripted::new(&[]);

        let result = resolve(&tree, &mut source);

        assert!(matches!(result, Err(InitError::Other(_))));
    }

    #[test]
    fn resolution_is_deterministic() {
        let tree = platform_tree();
        let answers = ["Android", "assembleRelease"];

        let first = resolve(&tree, &mut Scripted::new(&answers)).unwrap();
        let second = resolve(&tree, &mut Scripted::new(&answers)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.config_id, "android-config");
        assert_eq!(
            first.envs,
            vec![
                EnvAssignment::new("PLATFORM", "Android"),
                EnvAssignment::new("GRADLE_TASK", "assembleRelease"),
            ]
        );
    }

    #[test]
    fn prompt_answers_use_env_key_as_prompt_key() {
        let tree = platform_tree();
        let mut ui = MockUI::new();
        ui.set_prompt_response("PLATFORM", "Android");
        ui.set_prompt_response("GRADLE_TASK", "assemble");

        let resolution = resolve(&tree, &mut PromptAnswers::new(&mut ui)).unwrap();

        assert_eq!(resolution.config_id, "android-config");
        assert_eq!(ui.prompts_shown(), ["PLATFORM", "GRADLE_TASK"]);
    }

    #[test]
    fn prompt_answers_default_to_first_choice() {
        let tree = platform_tree();
        let mut ui = MockUI::new();
        ui.set_prompt_response("GRADLE_TASK", "assemble");

        let resolution = resolve(&tree, &mut PromptAnswers::new(&mut ui)).unwrap();

        // "Android" sorts before "iOS".
        assert_eq!(resolution.config_id, "android-config");
    }

    #[test]
    fn prompt_key_slugs_unbound_titles() {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("a");
        let root = b
            .question("Build Platform", None, [("x", leaf), ("y", leaf)])
            .unwrap();
        let tree = b.build(root).unwrap();

        assert_eq!(prompt_key(tree.question(root).unwrap()), "build_platform");
    }

    #[test]
    fn placeholder_constant_is_underscore() {
        assert_eq!(PLACEHOLDER, "_");
    }
}
