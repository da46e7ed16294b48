//! The recording surface handed to each plugin.

use serde_json::Value;

use crate::constants::DEFAULT_VERSION;
use crate::contribution::{extend_one_level, ConfigFileFragment, Manifest, PluginContribution};
use crate::error::{Error, Result};
use crate::protocol::Protocol;

/// Records one plugin's contribution without applying anything.
///
/// A fresh instance is built for every plugin invocation. Plugins can read
/// the manifest accumulated by the plugins that ran before them, but never
/// write to it: their own changes land in a private [`PluginContribution`]
/// that the generator folds in once `generate` returns successfully.
pub struct GeneratorApi<'a> {
    plugin_name: String,
    options: &'a Value,
    root_options: &'a Value,
    generated: &'a Manifest,
    contribution: PluginContribution,
}

impl<'a> GeneratorApi<'a> {
    pub fn new(
        plugin_name: impl Into<String>,
        options: &'a Value,
        root_options: &'a Value,
        generated: &'a Manifest,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            options,
            root_options,
            generated,
            contribution: PluginContribution::default(),
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Options selected for this plugin.
    pub fn options(&self) -> &Value {
        self.options
    }

    /// Options shared by every plugin of the run (package manager, registry).
    pub fn root_options(&self) -> &Value {
        self.root_options
    }

    /// Manifest merged from the plugins that ran before this one.
    pub fn generated_manifest(&self) -> &Manifest {
        self.generated
    }

    /// Adds a runtime dependency. The version defaults to `latest`.
    pub fn add_dependency(&mut self, name: &str, version: Option<&str>) {
        self.set_section_key("dependencies", name, version.unwrap_or(DEFAULT_VERSION));
    }

    /// Adds a development dependency. The version defaults to `latest`.
    pub fn add_dev_dependency(&mut self, name: &str, version: Option<&str>) {
        self.set_section_key("devDependencies", name, version.unwrap_or(DEFAULT_VERSION));
    }

    pub fn add_script(&mut self, name: &str, command: &str) {
        self.set_section_key("scripts", name, command);
    }

    fn set_section_key(&mut self, section: &str, key: &str, value: &str) {
        let entry = self
            .contribution
            .manifest
            .entry(section)
            .or_insert_with(|| Value::Object(Manifest::new()));
        if !entry.is_object() {
            *entry = Value::Object(Manifest::new());
        }
        if let Value::Object(map) = entry {
            map.insert(key.to_string(), Value::String(value.to_string()));
        }
    }

    /// Merges arbitrary manifest fields into this plugin's fragment.
    ///
    /// Nested objects merge one level deep; callers that need to keep deeper
    /// siblings must include them.
    pub fn extend_package(&mut self, fields: Value) -> Result<()> {
        match fields {
            Value::Object(fields) => {
                extend_one_level(&mut self.contribution.manifest, fields);
                Ok(())
            }
            other => Err(Error::Validation(format!(
                "extend_package expects an object, got {other}"
            ))),
        }
    }

    /// Assigns `data`'s sections into the named config-file fragment.
    pub fn extend_config_file(&mut self, file_name: &str, data: ConfigFileFragment) {
        let fragment = self.contribution.config_files.entry(file_name.to_string()).or_default();
        for (section, lines) in data {
            fragment.insert(section, lines);
        }
    }

    /// Appends a typed protocol operation.
    pub fn protocol(&mut self, op: Protocol) {
        self.contribution.protocol_ops.push(op);
    }

    /// Appends raw protocol operations (`{ KIND: { params } }` objects).
    ///
    /// Every well-formed operation is recorded in call order. Rejected ones
    /// are dropped and reported; the returned error describes them. A plugin
    /// that propagates it forfeits its whole contribution.
    pub fn protocol_generate(&mut self, ops: Value) -> Result<()> {
        let (parsed, errors) = Protocol::parse_ops(&ops);
        self.contribution.protocol_ops.extend(parsed);

        if errors.is_empty() {
            return Ok(());
        }

        let message = errors
            .iter()
            .map(|e| match e {
                Error::Protocol(reason) => reason.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; ");
        for error in errors {
            log::warn!("Plugin '{}': dropping operation. {}", self.plugin_name, error);
            self.contribution.errors.push(error);
        }
        Err(Error::Protocol(message))
    }

    /// Current, not yet merged, state of this plugin's contribution.
    pub fn template_data(&self) -> &PluginContribution {
        &self.contribution
    }

    pub fn into_contribution(self) -> PluginContribution {
        self.contribution
    }
}
