//! Option trees: the questions that lead from a repository to a pipeline.
//!
//! An [`OptionTree`] is a small decision tree. Each [`Question`] binds its
//! answer to an environment variable and branches by answer; each
//! [`ConfigLeaf`] names one pipeline template of the owning platform.
//!
//! Nodes live in an arena and refer to their children by [`NodeId`]. The
//! builder only accepts children that already exist, so a tree is acyclic by
//! construction and a leaf may be shared by several parents.
//!
//! # Example
//!
//! ```
//! use pipeline_init::options::{OptionTree, PLACEHOLDER};
//!
//! let mut builder = OptionTree::builder();
//! let leaf = builder.leaf("default-ios-config");
//! let scheme = builder.input("Scheme name", "BITRISE_SCHEME", leaf).unwrap();
//! let project = builder
//!     .input("Project (or Workspace) path", "BITRISE_PROJECT_PATH", scheme)
//!     .unwrap();
//! let tree = builder.build(project).unwrap();
//!
//! assert_eq!(tree.config_ids().len(), 1);
//! assert!(tree.question(tree.root()).unwrap().is_placeholder());
//! assert_eq!(PLACEHOLDER, "_");
//! ```

pub mod resolver;
pub mod snapshot;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{InitError, Result};

pub use resolver::{resolve, AnswerSource, PromptAnswers, Resolution};
pub use snapshot::{OptionDump, PlatformMap, ScanDump};

/// Answer key meaning "any user-supplied string is accepted here".
pub const PLACEHOLDER: &str = "_";

/// Index of a node inside its [`OptionTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A node of an option tree.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionNode {
    /// Asks for one value and branches by answer.
    Question(Question),
    /// Terminal node naming a pipeline template.
    Config(ConfigLeaf),
}

/// A question node.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    /// Human-readable prompt.
    pub title: String,
    /// Environment variable the answer is bound to, if any.
    pub env_key: Option<String>,
    children: BTreeMap<String, NodeId>,
}

impl Question {
    /// Answer keys in sorted order.
    pub fn answers(&self) -> Vec<&str> {
        self.children.keys().map(String::as_str).collect()
    }

    /// Answer/child pairs in sorted answer order.
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Child reached by a literal answer.
    pub fn child(&self, answer: &str) -> Option<NodeId> {
        self.children.get(answer).copied()
    }

    /// The only child, when there is exactly one.
    pub fn sole_child(&self) -> Option<(&str, NodeId)> {
        if self.children.len() == 1 {
            self.children().next()
        } else {
            None
        }
    }

    /// True when the only accepted answer is free text.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.sole_child(), Some((PLACEHOLDER, _)))
    }
}

/// A terminal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLeaf {
    /// Identifier of a template in the owning platform's template map.
    pub config_id: String,
}

/// An immutable option tree.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionTree {
    nodes: Vec<OptionNode>,
    root: NodeId,
}

impl OptionTree {
    /// Start building a tree.
    pub fn builder() -> OptionTreeBuilder {
        OptionTreeBuilder::default()
    }

    /// A tree made of a single configuration leaf.
    pub fn single(config_id: impl Into<String>) -> Self {
        let mut builder = Self::builder();
        let root = builder.leaf(config_id);
        Self {
            nodes: builder.nodes,
            root,
        }
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node.
    ///
    /// Ids handed out by this tree are always valid.
    pub fn node(&self, id: NodeId) -> &OptionNode {
        &self.nodes[id.0]
    }

    /// Look up a node that is expected to be a question.
    pub fn question(&self, id: NodeId) -> Option<&Question> {
        match self.node(id) {
            OptionNode::Question(question) => Some(question),
            OptionNode::Config(_) => None,
        }
    }

    /// Every configuration id reachable from the root.
    pub fn config_ids(&self) -> BTreeSet<&str> {
        let mut ids = BTreeSet::new();
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            match self.node(id) {
                OptionNode::Config(leaf) => {
                    ids.insert(leaf.config_id.as_str());
                }
                OptionNode::Question(question) => {
                    stack.extend(question.children().map(|(_, child)| child));
                }
            }
        }

        ids
    }

    /// Number of questions on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn walk(tree: &OptionTree, id: NodeId) -> usize {
            match tree.node(id) {
                OptionNode::Config(_) => 0,
                OptionNode::Question(question) => {
                    1 + question
                        .children()
                        .map(|(_, child)| walk(tree, child))
                        .max()
                        .unwrap_or(0)
                }
            }
        }
        walk(self, self.root)
    }
}

/// Builds an [`OptionTree`] bottom-up.
#[derive(Debug, Default)]
pub struct OptionTreeBuilder {
    nodes: Vec<OptionNode>,
}

impl OptionTreeBuilder {
    /// Add a configuration leaf.
    pub fn leaf(&mut self, config_id: impl Into<String>) -> NodeId {
        self.push(OptionNode::Config(ConfigLeaf {
            config_id: config_id.into(),
        }))
    }

    /// Add a question branching to existing nodes.
    ///
    /// An empty `env_key` is treated as unbound.
    pub fn question<I, K>(
        &mut self,
        title: &str,
        env_key: Option<&str>,
        children: I,
    ) -> Result<NodeId>
    where
        I: IntoIterator<Item = (K, NodeId)>,
        K: Into<String>,
    {
        let mut map = BTreeMap::new();

        for (answer, child) in children {
            let answer = answer.into();
            if child.0 >= self.nodes.len() {
                return Err(InitError::InvalidTree {
                    message: format!("question '{}' references an unknown node", title),
                });
            }
            if map.insert(answer.clone(), child).is_some() {
                return Err(InitError::InvalidTree {
                    message: format!("question '{}' has duplicate answer '{}'", title, answer),
                });
            }
        }

        if map.is_empty() {
            return Err(InitError::InvalidTree {
                message: format!("question '{}' has no answers", title),
            });
        }

        Ok(self.push(OptionNode::Question(Question {
            title: title.to_string(),
            env_key: env_key.filter(|k| !k.is_empty()).map(str::to_string),
            children: map,
        })))
    }

    /// Add a free-text question with a single follow-up node.
    pub fn input(&mut self, title: &str, env_key: &str, next: NodeId) -> Result<NodeId> {
        self.question(title, Some(env_key), [(PLACEHOLDER, next)])
    }

    /// Finish the tree.
    pub fn build(self, root: NodeId) -> Result<OptionTree> {
        if root.0 >= self.nodes.len() {
            return Err(InitError::InvalidTree {
                message: "root references an unknown node".to_string(),
            });
        }
        Ok(OptionTree {
            nodes: self.nodes,
            root,
        })
    }

    fn push(&mut self, node: OptionNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn platform_tree() -> OptionTree {
        let mut b = OptionTree::builder();
        let ios = b.leaf("ios-config");
        let android = b.leaf("android-config");
        let root = b
            .question("Build platform", None, [("iOS", ios), ("Android", android)])
            .unwrap();
        b.build(root).unwrap()
    }

    #[test]
    fn single_leaf_tree() {
        let tree = OptionTree::single("other-config");
        assert!(matches!(tree.node(tree.root()), OptionNode::Config(_)));
        assert_eq!(tree.config_ids().into_iter().collect::<Vec<_>>(), ["other-config"]);
        assert_eq!(tree.depth(), 0);
    }

    #[test]
    fn answers_are_sorted() {
        let tree = platform_tree();
        let root = tree.question(tree.root()).unwrap();
        assert_eq!(root.answers(), vec!["Android", "iOS"]);
    }

    #[test]
    fn question_rejects_empty_children() {
        let mut b = OptionTree::builder();
        let result = b.question("Empty", Some("KEY"), Vec::<(String, NodeId)>::new());
        assert!(matches!(result, Err(InitError::InvalidTree { .. })));
    }

    #[test]
    fn question_rejects_duplicate_answers() {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("a");
        let result = b.question("Dup", Some("KEY"), [("x", leaf), ("x", leaf)]);
        assert!(matches!(result, Err(InitError::InvalidTree { .. })));
    }

    #[test]
    fn question_rejects_foreign_node() {
        let mut other = OptionTree::builder();
        other.leaf("a");
        let foreign = other.leaf("b");

        let mut b = OptionTree::builder();
        let result = b.question("Foreign", None, [("x", foreign)]);
        assert!(result.is_err());
    }

    #[test]
    fn empty_env_key_is_unbound() {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("a");
        let q = b.question("Task", Some(""), [("Build", leaf)]).unwrap();
        let tree = b.build(q).unwrap();
        assert_eq!(tree.question(q).unwrap().env_key, None);
    }

    #[test]
    fn shared_leaf_counted_once() {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("cordova-config");
        let platform = b
            .question(
                "Platform",
                Some("CORDOVA_PLATFORM"),
                [("ios", leaf), ("android", leaf), ("ios,android", leaf)],
            )
            .unwrap();
        let tree = b.build(platform).unwrap();
        assert_eq!(tree.config_ids().len(), 1);
    }

    #[test]
    fn placeholder_detection() {
        let mut b = OptionTree::builder();
        let leaf = b.leaf("a");
        let input = b.input("Path", "PATH_KEY", leaf).unwrap();
        let fixed = b.question("Fixed", Some("FIXED"), [("only", input)]).unwrap();
        let tree = b.build(fixed).unwrap();

        assert!(tree.question(input).unwrap().is_placeholder());
        assert!(!tree.question(fixed).unwrap().is_placeholder());
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn build_rejects_unknown_root() {
        let mut other = OptionTree::builder();
        other.leaf("a");
        let far = other.leaf("b");
        let b = OptionTree::builder();
        assert!(b.build(far).is_err());
    }
}
