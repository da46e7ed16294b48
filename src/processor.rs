//! Turns the merged plugin state and a template tree into the final file map.
//!
//! Rendering happens entirely in memory. Nothing touches the output directory
//! until [`crate::writer::Writer::commit`] runs.

use std::fs;
use std::path::Path;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use walkdir::WalkDir;

use crate::contribution::{merge_manifest, ConfigFileFragment, Manifest, MergedProjectState};
use crate::error::{Error, Result};
use crate::imports::insert_import;
use crate::protocol::{FileContent, ImportSpec, Protocol};
use crate::renderer::TemplateRenderer;

/// In-memory project tree produced by the renderer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    /// Project-relative directories, mirrored even when empty.
    pub dirs: IndexSet<String>,
    /// Project-relative path -> text content.
    pub files: IndexMap<String, String>,
    /// Files that are not UTF-8, copied verbatim.
    pub binaries: IndexMap<String, Vec<u8>>,
}

impl ProjectFiles {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Sets the text content of `path`, replacing any binary at that path.
    pub fn insert_text(&mut self, path: impl Into<String>, content: String) {
        let path = path.into();
        self.binaries.shift_remove(&path);
        self.files.insert(path, content);
    }

    /// Sets the bytes of `path`, replacing any text at that path.
    pub fn insert_binary(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        let path = path.into();
        self.files.shift_remove(&path);
        self.binaries.insert(path, bytes);
    }
}

/// Checks that a rendered path is relative, non-empty and stays inside the
/// project.
pub fn is_valid_output_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path.split('/').all(|part| !part.is_empty() && part != "..")
}

/// Joins the components of a relative path with `/`.
fn to_project_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// `src/main.ts` -> `src/main`. Dotfiles keep their name.
fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => &path[..name_start + dot],
        _ => path,
    }
}

/// Builds the context every template is rendered against.
pub fn build_context(
    state: &MergedProjectState,
    project_name: Option<&str>,
    options: &serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "project": { "name": project_name.unwrap_or_default() },
        "manifest": state.manifest,
        "configFiles": state.config_files,
        "plugins": state.plugins,
        "options": options,
    })
}

/// Renders templates and resolves protocol operations into [`ProjectFiles`].
pub struct Processor<'a> {
    engine: &'a dyn TemplateRenderer,
    context: serde_json::Value,
    manifest_file: String,
}

impl<'a> Processor<'a> {
    pub fn new(
        engine: &'a dyn TemplateRenderer,
        context: serde_json::Value,
        manifest_file: impl Into<String>,
    ) -> Self {
        Self { engine, context, manifest_file: manifest_file.into() }
    }

    /// Runs the whole render phase and returns the file map, the final
    /// manifest and every per-file error that was isolated along the way.
    pub fn process(
        &self,
        template_root: Option<&Path>,
        state: &MergedProjectState,
    ) -> Result<(ProjectFiles, Manifest, Vec<Error>)> {
        let mut project = ProjectFiles::default();
        let mut diagnostics = Vec::new();

        if let Some(root) = template_root {
            self.render_tree(root, &mut project, &mut diagnostics)?;
        }
        let mut manifest = self.apply_manifest(&state.manifest, &mut project, &mut diagnostics);
        self.apply_config_files(&state.config_files, &mut project);
        let merged = project.get(&self.manifest_file).map(str::to_string);
        for tagged in &state.protocol_ops {
            debug!("Resolving {} from plugin '{}'", tagged.op.kind(), tagged.plugin);
            self.apply_protocol(&tagged.op, &mut project, &mut diagnostics);
        }

        if let Some(content) = project.get(&self.manifest_file) {
            if merged.as_deref() != Some(content) {
                manifest = self.reparse_manifest(content, manifest, &mut diagnostics);
            }
        }

        Ok((project, manifest, diagnostics))
    }

    /// Takes a manifest file rewritten by `RENDER_FILE` as the final
    /// manifest. Content that is not a JSON object keeps `merged`.
    fn reparse_manifest(
        &self,
        content: &str,
        merged: Manifest,
        diagnostics: &mut Vec<Error>,
    ) -> Manifest {
        log::warn!("'{}' was replaced by a RENDER_FILE operation", self.manifest_file);
        match serde_json::from_str::<Manifest>(content) {
            Ok(manifest) => manifest,
            Err(e) => {
                diagnostics.push(Error::Render {
                    path: self.manifest_file.clone(),
                    message: format!("rendered manifest is not valid JSON: {e}"),
                });
                merged
            }
        }
    }

    /// Mirrors the template tree into `project`, rendering every text file.
    ///
    /// Siblings are visited in file-name order so repeated runs produce the
    /// same map. A file that fails to render is reported and skipped.
    pub fn render_tree(
        &self,
        template_root: &Path,
        project: &mut ProjectFiles,
        diagnostics: &mut Vec<Error>,
    ) -> Result<()> {
        if !template_root.is_dir() {
            return Err(Error::TemplateDoesNotExist {
                template_dir: template_root.display().to_string(),
            });
        }
        debug!("Rendering template tree {}", template_root.display());

        for entry in WalkDir::new(template_root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    log::warn!("Skipping unreadable template entry '{}': {}", path, e);
                    diagnostics.push(Error::Render { path, message: e.to_string() });
                    continue;
                }
            };
            let relative = entry
                .path()
                .strip_prefix(template_root)
                .map_err(|e| Error::Validation(e.to_string()))?;
            let project_path = to_project_path(relative);

            if entry.file_type().is_dir() {
                debug!("Directory: {}", project_path);
                project.dirs.insert(project_path);
                continue;
            }

            let bytes = match fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Failed to read template '{}': {}", project_path, e);
                    diagnostics.push(Error::Render { path: project_path, message: e.to_string() });
                    continue;
                }
            };

            match String::from_utf8(bytes) {
                Ok(source) => match self.engine.render(&project_path, &source, &self.context) {
                    Ok(rendered) => {
                        debug!("Rendered: {}", project_path);
                        project.insert_text(project_path, rendered);
                    }
                    Err(e) => {
                        log::warn!("Failed to render '{}': {}", project_path, e);
                        diagnostics
                            .push(Error::Render { path: project_path, message: e.to_string() });
                    }
                },
                Err(e) => {
                    debug!("Copying binary file: {}", project_path);
                    project.insert_binary(project_path, e.into_bytes());
                }
            }
        }
        Ok(())
    }

    /// Folds the plugin manifest onto the template's own manifest, if any,
    /// and writes the result. A template without plugin contributions keeps
    /// its manifest byte for byte.
    fn apply_manifest(
        &self,
        plugins_manifest: &Manifest,
        project: &mut ProjectFiles,
        diagnostics: &mut Vec<Error>,
    ) -> Manifest {
        let existing = project.files.get(&self.manifest_file);

        if plugins_manifest.is_empty() {
            return existing
                .and_then(|content| serde_json::from_str::<Manifest>(content).ok())
                .unwrap_or_default();
        }

        let mut manifest = match existing.map(|content| serde_json::from_str::<Manifest>(content)) {
            Some(Ok(base)) => base,
            Some(Err(e)) => {
                log::warn!("Template manifest '{}' is not valid JSON: {}", self.manifest_file, e);
                diagnostics.push(Error::Render {
                    path: self.manifest_file.clone(),
                    message: format!("template manifest is not valid JSON: {e}"),
                });
                Manifest::new()
            }
            None => Manifest::new(),
        };
        merge_manifest(&mut manifest, plugins_manifest.clone());

        match serde_json::to_string_pretty(&manifest) {
            Ok(mut content) => {
                content.push('\n');
                project.insert_text(self.manifest_file.clone(), content);
            }
            Err(e) => diagnostics
                .push(Error::Render { path: self.manifest_file.clone(), message: e.to_string() }),
        }
        manifest
    }

    /// Synthesises config files that no template provided. Files the
    /// template already carries consume their fragment through the context.
    fn apply_config_files(
        &self,
        config_files: &IndexMap<String, ConfigFileFragment>,
        project: &mut ProjectFiles,
    ) {
        for (file_name, fragment) in config_files {
            if project.files.contains_key(file_name) {
                debug!("Config file '{}' provided by template", file_name);
                continue;
            }
            let mut content = fragment
                .values()
                .filter(|lines| !lines.is_empty())
                .map(|lines| lines.join("\n"))
                .collect::<Vec<_>>()
                .join("\n\n");
            content.push('\n');
            debug!("Synthesised config file '{}'", file_name);
            project.insert_text(file_name.clone(), content);
        }
    }

    /// Applies a single protocol operation to the file map.
    pub fn apply_protocol(
        &self,
        op: &Protocol,
        project: &mut ProjectFiles,
        diagnostics: &mut Vec<Error>,
    ) {
        match op {
            Protocol::RenderFile { files } => {
                for (path, content) in files {
                    match self.render_content(path, content) {
                        Ok(rendered) => {
                            project.insert_text(path.clone(), rendered);
                        }
                        Err(e) => {
                            log::warn!("{}", e);
                            diagnostics.push(e);
                        }
                    }
                }
            }
            Protocol::InsertImport { imports } => {
                for spec in imports {
                    if let Err(e) = self.insert(spec, project) {
                        log::warn!("{}", e);
                        diagnostics.push(e);
                    }
                }
            }
        }
    }

    fn render_content(&self, path: &str, content: &FileContent) -> Result<String> {
        if !is_valid_output_path(path) {
            return Err(Error::Render {
                path: path.to_string(),
                message: "path must be relative and stay inside the project".to_string(),
            });
        }
        let rendered = match content {
            FileContent::Template(source) => {
                self.engine.render(path, source, &self.context).map_err(|e| e.to_string())
            }
            FileContent::Custom(renderer) => {
                renderer.render(&self.context).map_err(|e| format!("{e:#}"))
            }
        };
        rendered.map_err(|message| Error::Render { path: path.to_string(), message })
    }

    fn insert(&self, spec: &ImportSpec, project: &mut ProjectFiles) -> Result<()> {
        let target = if project.files.contains_key(&spec.dir) {
            Some(spec.dir.clone())
        } else {
            project.files.keys().find(|path| strip_extension(path) == spec.dir).cloned()
        };
        let Some(target) = target else {
            return Err(Error::Render {
                path: spec.dir.clone(),
                message: format!("no file to insert '{}' into", spec.statement()),
            });
        };

        if let Some(content) = project.files.get_mut(&target) {
            match insert_import(content, &spec.statement()) {
                Some(updated) => {
                    debug!("Inserted import of '{}' into {}", spec.from, target);
                    *content = updated;
                }
                None => debug!("Import of '{}' already present in {}", spec.from, target),
            }
        }
        Ok(())
    }
}
