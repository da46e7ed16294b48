//! On-disk declarative plugins.
//!
//! A plugin directory (`<root>/plugin-<name>/`) holds a `generator.json`,
//! `generator.yaml` or `generator.yml` describing the plugin's contribution
//! as data:
//!
//! ```yaml
//! devDependencies:
//!   husky: ^9.0.11
//! scripts:
//!   postinstall: husky install
//! package:
//!   lint-staged:
//!     "*.{ts,tsx,js,jsx}": ["{{ root.packageManager }} format:ci"]
//! protocols:
//!   - RENDER_FILE:
//!       params:
//!         files:
//!           .commitlintrc.js: "module.exports = { extends: ['@commitlint/config-conventional'] };"
//! variants:
//!   strict:
//!     scripts:
//!       pre-commit: lint-staged
//! ```
//!
//! String values are MiniJinja templates rendered against the plugin options
//! (`options`) and the run-wide options (`root`) before they are applied.
//! Protocol operations are kept raw: their templates see the project context.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use crate::api::GeneratorApi;
use crate::constants::{PLUGIN_DIR_PATTERN, PLUGIN_FILES};
use crate::contribution::ConfigFileFragment;
use crate::error::{Error, Result};
use crate::loader::{ModuleResolver, Plugin};
use crate::renderer::{render_value, MiniJinjaRenderer};

/// Contribution fields shared by the plugin body and its variants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarativeContribution {
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub scripts: IndexMap<String, String>,
    /// Arbitrary manifest fields, applied through `extend_package`.
    #[serde(default)]
    pub package: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub config_files: IndexMap<String, ConfigFileFragment>,
    /// Raw protocol operations, applied through `protocol_generate`.
    #[serde(default)]
    pub protocols: Vec<serde_json::Value>,
}

impl DeclarativeContribution {
    fn apply(self, api: &mut GeneratorApi<'_>) -> anyhow::Result<()> {
        for (name, version) in &self.dependencies {
            api.add_dependency(name, Some(version));
        }
        for (name, version) in &self.dev_dependencies {
            api.add_dev_dependency(name, Some(version));
        }
        for (name, command) in &self.scripts {
            api.add_script(name, command);
        }
        if !self.package.is_empty() {
            api.extend_package(serde_json::Value::Object(self.package))?;
        }
        for (file_name, fragment) in self.config_files {
            api.extend_config_file(&file_name, fragment);
        }
        for ops in self.protocols {
            // Rejected operations are recorded by the api, the rest apply.
            let _ = api.protocol_generate(ops);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeclarativeSpec {
    #[serde(flatten)]
    base: DeclarativeContribution,
    #[serde(default)]
    variants: IndexMap<String, DeclarativeContribution>,
    #[serde(default)]
    default_variant: Option<String>,
}

/// A data-only plugin loaded from a plugin directory.
pub struct DeclarativePlugin {
    name: String,
    document: serde_json::Value,
    engine: MiniJinjaRenderer,
}

impl DeclarativePlugin {
    /// Parses a plugin document, JSON first and YAML as a fallback.
    ///
    /// # Errors
    /// * `Error::Config` if the content is neither valid JSON nor YAML, or
    ///   does not have the declarative plugin shape
    pub fn parse(name: &str, content: &str) -> Result<Self> {
        let document: serde_json::Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(_) => serde_yaml::from_str(content)
                .map_err(|e| Error::Config(format!("invalid plugin format: {e}")))?,
        };
        serde_json::from_value::<DeclarativeSpec>(document.clone())
            .map_err(|e| Error::Config(format!("invalid plugin schema: {e}")))?;

        Ok(Self { name: name.to_string(), document, engine: MiniJinjaRenderer::new() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders every field except `protocols`, whose templates are rendered
    /// later against the project context.
    fn render_document(
        &self,
        document: &serde_json::Value,
        context: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let Some(fields) = document.as_object() else {
            return Ok(document.clone());
        };
        let mut out = serde_json::Map::new();
        for (key, value) in fields {
            let value = match (key.as_str(), value) {
                ("protocols", _) => value.clone(),
                ("variants", serde_json::Value::Object(variants)) => {
                    let mut rendered = serde_json::Map::new();
                    for (name, variant) in variants {
                        rendered.insert(name.clone(), self.render_document(variant, context)?);
                    }
                    serde_json::Value::Object(rendered)
                }
                _ => render_value(&self.engine, &self.name, value, context)?,
            };
            out.insert(key.clone(), value);
        }
        Ok(serde_json::Value::Object(out))
    }
}

impl Plugin for DeclarativePlugin {
    fn generate(&self, api: &mut GeneratorApi<'_>) -> anyhow::Result<()> {
        let context = serde_json::json!({
            "options": api.options(),
            "root": api.root_options(),
        });
        let rendered = self.render_document(&self.document, &context)?;
        let spec: DeclarativeSpec = serde_json::from_value(rendered)?;

        let variant = api
            .options()
            .get("variant")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or(spec.default_variant);

        spec.base.apply(api)?;

        if let Some(variant) = variant {
            let mut variants = spec.variants;
            match variants.shift_remove(&variant) {
                Some(extra) => {
                    debug!("Plugin '{}': applying variant '{}'", self.name, variant);
                    extra.apply(api)?;
                }
                None => log::warn!(
                    "Plugin '{}' has no variant '{}', using its base configuration",
                    self.name,
                    variant
                ),
            }
        }
        Ok(())
    }
}

/// Resolves plugins from `<root>/<pattern>` directories, where `{name}` in the
/// pattern is replaced by the lower-cased plugin name.
pub struct DirectoryResolver {
    root: PathBuf,
    pattern: String,
}

impl DirectoryResolver {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf(), pattern: PLUGIN_DIR_PATTERN.to_string() }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Directory the plugin called `name` is expected in.
    pub fn plugin_dir(&self, name: &str) -> PathBuf {
        self.root.join(self.pattern.replace("{name}", &name.to_lowercase()))
    }
}

impl ModuleResolver for DirectoryResolver {
    fn resolve(&self, name: &str) -> Result<Rc<dyn Plugin>> {
        let failed = |message: String| Error::PluginResolution { plugin: name.to_string(), message };

        let dir = self.plugin_dir(name);
        if !dir.is_dir() {
            return Err(failed(format!("directory '{}' not found", dir.display())));
        }

        let file = PLUGIN_FILES
            .iter()
            .map(|file| dir.join(file))
            .find(|path| path.is_file())
            .ok_or_else(|| {
                failed(format!(
                    "no plugin file in '{}' (tried: {})",
                    dir.display(),
                    PLUGIN_FILES.join(", ")
                ))
            })?;

        debug!("Loading plugin '{}' from {}", name, file.display());
        let content = fs::read_to_string(&file).map_err(|e| failed(e.to_string()))?;
        let plugin = DeclarativePlugin::parse(name, &content).map_err(|e| failed(e.to_string()))?;
        Ok(Rc::new(plugin))
    }
}
