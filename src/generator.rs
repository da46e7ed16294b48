//! Core generation orchestration.
//! Runs every selected plugin in order, then folds their contributions in
//! one ordered pass and hands the merged state to the processor. Writing to
//! disk is a separate step.

use std::fmt;
use std::path::Path;

use log::{debug, error, info, warn};
use serde::Deserialize;

use crate::api::GeneratorApi;
use crate::constants::MANIFEST_FILE;
use crate::contribution::{merge_manifest, Manifest, MergedProjectState};
use crate::error::{Error, Result};
use crate::loader::ModuleResolver;
use crate::processor::{build_context, Processor, ProjectFiles};
use crate::renderer::TemplateRenderer;
use crate::writer::{CommitSummary, Writer};

/// A plugin selected for the run, with its options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default)]
    pub options: serde_json::Value,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), options: serde_json::Value::Null }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Plugin at this index is waiting to run.
    Pending(usize),
    /// Plugin at this index is running.
    Running(usize),
    Merging,
    Rendering,
    Committing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pending(i) => write!(f, "PENDING[{i}]"),
            Stage::Running(i) => write!(f, "RUNNING[{i}]"),
            Stage::Merging => f.write_str("MERGING"),
            Stage::Rendering => f.write_str("RENDERING"),
            Stage::Committing => f.write_str("COMMITTING"),
            Stage::Done => f.write_str("DONE"),
        }
    }
}

/// Result of a generation run, ready to be committed.
#[derive(Debug)]
pub struct Generation {
    /// Final manifest, template manifest included. Reflects a `RENDER_FILE`
    /// that replaced the manifest file.
    pub manifest: Manifest,
    pub files: ProjectFiles,
    /// Isolated per-plugin and per-file errors.
    pub diagnostics: Vec<Error>,
}

/// Orchestrates plugins, merging and rendering.
pub struct Generator<'a> {
    resolver: &'a dyn ModuleResolver,
    engine: &'a dyn TemplateRenderer,
    project_name: Option<String>,
    root_options: serde_json::Value,
    manifest_file: String,
    stage: Stage,
}

impl<'a> Generator<'a> {
    pub fn new(resolver: &'a dyn ModuleResolver, engine: &'a dyn TemplateRenderer) -> Self {
        Self {
            resolver,
            engine,
            project_name: None,
            root_options: serde_json::Value::Object(serde_json::Map::new()),
            manifest_file: MANIFEST_FILE.to_string(),
            stage: Stage::Pending(0),
        }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Options shared by every plugin of the run.
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.root_options = options;
        self
    }

    pub fn with_manifest_file(mut self, manifest_file: impl Into<String>) -> Self {
        self.manifest_file = manifest_file.into();
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, stage: Stage) {
        debug!("Stage {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    /// Runs every plugin in the given order and renders the result.
    ///
    /// # Errors
    /// * `Error::NoPluginsResolved` if plugins were requested and none of
    ///   them could be resolved
    /// * `Error::TemplateDoesNotExist` if `template` is not a directory
    pub fn generate(
        &mut self,
        template: Option<&Path>,
        plugins: &[PluginSpec],
    ) -> Result<Generation> {
        let mut contributions = Vec::new();
        let mut diagnostics = Vec::new();
        let mut visible = Manifest::new();
        let mut resolved = 0;

        for (index, spec) in plugins.iter().enumerate() {
            self.enter(Stage::Pending(index));
            let plugin = match self.resolver.resolve(&spec.name) {
                Ok(plugin) => plugin,
                Err(e) => {
                    error!("{}", e);
                    diagnostics.push(e);
                    continue;
                }
            };
            resolved += 1;

            self.enter(Stage::Running(index));
            let mut api = GeneratorApi::new(&spec.name, &spec.options, &self.root_options, &visible);
            let outcome = plugin.generate(&mut api);
            let mut contribution = api.into_contribution();

            match outcome {
                Ok(()) => {
                    debug!(
                        "Plugin '{}' contributed {} manifest section(s), {} config file(s), {} operation(s)",
                        spec.name,
                        contribution.manifest.len(),
                        contribution.config_files.len(),
                        contribution.protocol_ops.len()
                    );
                    diagnostics.append(&mut contribution.errors);
                    merge_manifest(&mut visible, contribution.manifest.clone());
                    contributions.push((spec.name.as_str(), contribution));
                }
                Err(e) => {
                    let e = Error::PluginExecution {
                        plugin: spec.name.clone(),
                        message: format!("{e:#}"),
                    };
                    error!("{}", e);
                    diagnostics.push(e);
                }
            }
        }

        if !plugins.is_empty() && resolved == 0 {
            return Err(Error::NoPluginsResolved {
                requested: plugins.iter().map(|p| p.name.clone()).collect(),
            });
        }

        self.enter(Stage::Merging);
        let mut state = MergedProjectState::default();
        for (name, contribution) in contributions {
            state.fold(name, contribution);
        }
        info!("Merged {} of {} plugin(s)", state.plugins.len(), plugins.len());

        self.enter(Stage::Rendering);
        let context = build_context(&state, self.project_name.as_deref(), &self.root_options);
        let processor = Processor::new(self.engine, context, self.manifest_file.clone());
        let (files, manifest, render_errors) = processor.process(template, &state)?;
        diagnostics.extend(render_errors);

        if !diagnostics.is_empty() {
            warn!("Generation finished with {} problem(s)", diagnostics.len());
        }

        Ok(Generation { manifest, files, diagnostics })
    }

    /// Writes a generation to `output_root` as one batch.
    ///
    /// # Errors
    /// * `Error::Commit` with the paths not yet written
    pub fn commit<P: AsRef<Path>>(
        &mut self,
        generation: &Generation,
        output_root: P,
        dry_run: bool,
    ) -> Result<CommitSummary> {
        self.enter(Stage::Committing);
        let summary = Writer::new(output_root).dry_run(dry_run).commit(&generation.files)?;
        self.enter(Stage::Done);
        Ok(summary)
    }
}
