//! Configuration handling for kiln runs.
//! A run can be described by a `kiln.json`, `kiln.yml` or `kiln.yaml` file
//! listing the template, the ordered plugin selection and shared options.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::constants::{CONFIG_FILES, DEFAULT_PLUGINS_DIR, MANIFEST_FILE};
use crate::error::{Error, Result};
use crate::generator::PluginSpec;

fn default_manifest_file() -> String {
    MANIFEST_FILE.to_string()
}

fn default_options() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Description of one generation run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerationConfig {
    /// Project name, exposed to templates as `project.name`.
    #[serde(default)]
    pub name: Option<String>,

    /// Template directory, relative to the config file.
    #[serde(default)]
    pub template: Option<PathBuf>,

    /// Plugins in invocation order, each with its options.
    #[serde(default)]
    pub plugins: IndexMap<String, serde_json::Value>,

    /// Directory holding on-disk plugins, relative to the config file.
    #[serde(default)]
    pub plugins_dir: Option<PathBuf>,

    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Fail on unresolved template variables.
    #[serde(default)]
    pub strict: bool,

    /// Options shared by every plugin (`packageManager`, `registry`, ...).
    #[serde(default = "default_options")]
    pub options: serde_json::Value,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            name: None,
            template: None,
            plugins: IndexMap::new(),
            plugins_dir: None,
            manifest_file: default_manifest_file(),
            strict: false,
            options: default_options(),
        }
    }
}

impl GenerationConfig {
    /// Plugin selection in invocation order.
    pub fn plugin_specs(&self) -> Vec<PluginSpec> {
        self.plugins
            .iter()
            .map(|(name, options)| PluginSpec::new(name).with_options(options.clone()))
            .collect()
    }

    /// Appends a plugin unless it is already selected.
    pub fn add_plugin(&mut self, name: &str) {
        if !self.plugins.contains_key(name) {
            self.plugins.insert(name.to_string(), serde_json::Value::Null);
        }
    }

    /// Plugin directory, falling back to `plugins`.
    pub fn plugins_dir(&self) -> PathBuf {
        self.plugins_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_PLUGINS_DIR))
    }

    /// Makes relative template and plugin paths relative to `base`.
    fn resolve_paths(&mut self, base: &Path) {
        if let Some(template) = self.template.as_mut() {
            if template.is_relative() {
                *template = base.join(&*template);
            }
        }
        if let Some(dir) = self.plugins_dir.as_mut() {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

/// Finds the first config file present in `dir`.
///
/// # Returns
/// * `Option<PathBuf>` - Path of the first existing file of [`CONFIG_FILES`]
pub fn find_config<P: AsRef<Path>>(dir: P) -> Option<PathBuf> {
    CONFIG_FILES.iter().map(|file| dir.as_ref().join(file)).find(|path| path.is_file())
}

/// Parses config content. JSON is tried first, then YAML.
///
/// # Errors
/// * `Error::Config` if parsing fails
pub fn parse_config(content: &str) -> Result<GenerationConfig> {
    match serde_json::from_str(content) {
        Ok(config) => Ok(config),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid configuration format: {e}"))),
    }
}

/// Loads a config file and resolves its relative paths against the file's
/// directory.
///
/// # Errors
/// * `Error::Config` if the file does not exist or cannot be parsed
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GenerationConfig> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::Config(format!(
            "No configuration file found at '{}' (expected one of: {})",
            path.display(),
            CONFIG_FILES.join(", ")
        )));
    }
    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}
