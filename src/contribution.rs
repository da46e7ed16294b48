//! Per-plugin contribution records and the rules that fold them together.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Error;
use crate::protocol::Protocol;

/// A package manifest: section name -> value, insertion ordered.
pub type Manifest = serde_json::Map<String, Value>;

/// Config-file fragment: section -> ordered operation lines.
pub type ConfigFileFragment = IndexMap<String, Vec<String>>;

/// Everything one plugin recorded during a single `generate` call.
#[derive(Debug, Default)]
pub struct PluginContribution {
    pub manifest: Manifest,
    pub config_files: IndexMap<String, ConfigFileFragment>,
    pub protocol_ops: Vec<Protocol>,
    /// Protocol errors raised while the plugin ran. Reported, never merged.
    pub errors: Vec<Error>,
}

impl PluginContribution {
    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty() && self.config_files.is_empty() && self.protocol_ops.is_empty()
    }
}

/// A protocol operation together with the plugin that declared it.
#[derive(Debug, Clone)]
pub struct TaggedProtocol {
    pub plugin: String,
    pub op: Protocol,
}

/// The generator's accumulated result across all plugins.
#[derive(Debug, Default)]
pub struct MergedProjectState {
    pub manifest: Manifest,
    pub config_files: IndexMap<String, ConfigFileFragment>,
    pub protocol_ops: Vec<TaggedProtocol>,
    /// Plugins whose contributions were folded in, in order.
    pub plugins: Vec<String>,
}

impl MergedProjectState {
    /// Folds one successful plugin's contribution into the state.
    pub fn fold(&mut self, plugin: &str, contribution: PluginContribution) {
        merge_manifest(&mut self.manifest, contribution.manifest);

        for (file_name, fragment) in contribution.config_files {
            let target = self.config_files.entry(file_name).or_default();
            for (section, lines) in fragment {
                let existing = target.entry(section).or_default();
                for line in lines {
                    if !existing.contains(&line) {
                        existing.push(line);
                    }
                }
            }
        }

        self.protocol_ops.extend(
            contribution
                .protocol_ops
                .into_iter()
                .map(|op| TaggedProtocol { plugin: plugin.to_string(), op }),
        );
        self.plugins.push(plugin.to_string());
    }
}

/// Shallow merge used by `extend_package` inside one plugin.
///
/// When both the existing and the incoming value under a key are objects,
/// the incoming keys are assigned one by one. Anything else is replaced.
pub fn extend_one_level(target: &mut Manifest, fields: serde_json::Map<String, Value>) {
    for (key, incoming) in fields {
        let incoming = match (target.get_mut(&key), incoming) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                existing.extend(incoming);
                continue;
            }
            (_, incoming) => incoming,
        };
        target.insert(key, incoming);
    }
}

/// Cross-plugin merge of manifests.
///
/// Objects merge key by key, arrays concatenate without repeating items that
/// are already present, everything else is last-writer-wins. Skipping present
/// items is intentional: re-running a plugin, or two plugins adding the same
/// lint command, leaves the array unchanged.
pub fn merge_manifest(target: &mut Manifest, source: Manifest) {
    for (key, incoming) in source {
        if let Some(existing) = target.get_mut(&key) {
            merge_value(existing, incoming);
        } else {
            target.insert(key, incoming);
        }
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => merge_manifest(existing, incoming),
        (Value::Array(existing), Value::Array(incoming)) => {
            for item in incoming {
                if !existing.contains(&item) {
                    existing.push(item);
                }
            }
        }
        (existing, incoming) => *existing = incoming,
    }
}
