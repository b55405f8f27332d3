//! Exhaustive, machine-readable dump of option trees and templates.
//!
//! The dump is a compatibility surface: downstream tooling reads the
//! `options`/`configs` keys, the `title`/`env_key`/`value_map`/`config`
//! node shape and the literal `"_"` placeholder answers.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{InitError, Result};
use crate::scan::ScanResult;

use super::{OptionNode, OptionTree};

/// Platform-keyed values kept in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for PlatformMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> PlatformMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced entry keeps its position.
    pub fn insert(&mut self, platform: &str, value: V) {
        match self.get_mut(platform) {
            Some(slot) => *slot = value,
            None => self.entries.push((platform.to_string(), value)),
        }
    }

    /// Look up a platform.
    pub fn get(&self, platform: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(name, _)| name == platform)
            .map(|(_, v)| v)
    }

    /// Look up a platform mutably.
    pub fn get_mut(&mut self, platform: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == platform)
            .map(|(_, v)| v)
    }

    /// Platform names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Number of platforms.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no platform is present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for PlatformMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Serialized form of one option node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDump {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_key: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub value_map: BTreeMap<String, OptionDump>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
}

impl OptionDump {
    /// Expand every branch of `tree`.
    pub fn from_tree(tree: &OptionTree) -> Self {
        fn expand(tree: &OptionTree, id: super::NodeId) -> OptionDump {
            match tree.node(id) {
                OptionNode::Config(leaf) => OptionDump {
                    config: Some(leaf.config_id.clone()),
                    ..OptionDump::default()
                },
                OptionNode::Question(question) => OptionDump {
                    title: Some(question.title.clone()),
                    env_key: question.env_key.clone(),
                    value_map: question
                        .children()
                        .map(|(answer, child)| (answer.to_string(), expand(tree, child)))
                        .collect(),
                    config: None,
                },
            }
        }
        expand(tree, tree.root())
    }
}

/// The two-part snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanDump {
    pub options: PlatformMap<OptionDump>,
    pub configs: PlatformMap<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "PlatformMap::is_empty")]
    pub warnings: PlatformMap<Vec<String>>,
}

impl ScanDump {
    /// Dump a finished scan, platforms in scan order.
    pub fn from_result(result: &ScanResult) -> Self {
        let mut dump = Self::default();

        for platform in result.platforms() {
            if let Some(tree) = result.tree(platform) {
                dump.options.insert(platform, OptionDump::from_tree(tree));
            }
            if let Some(templates) = result.templates(platform) {
                dump.configs.insert(platform, templates.clone());
            }
        }

        for (platform, warnings) in result.all_warnings() {
            if !warnings.is_empty() {
                dump.warnings.insert(platform, warnings.clone());
            }
        }

        dump
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| InitError::Other(e.into()))
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| InitError::Other(e.into()))
    }
}
