//! Error handling for kiln.
//! Defines the error taxonomy shared by the generator, the renderer and the
//! commit phase, plus the `Result` alias used throughout the crate.

use thiserror::Error;

/// Errors that can occur while generating a project.
///
/// Plugin, protocol and render errors are isolated: the generator collects
/// them as diagnostics and keeps going. `NoPluginsResolved` and `Commit`
/// abort the run.
#[derive(Error, Debug)]
pub enum Error {
    /// The plugin could not be located or loaded.
    #[error("Failed to resolve plugin '{plugin}': {message}.")]
    PluginResolution { plugin: String, message: String },

    /// The plugin's generate function returned an error.
    #[error("Plugin '{plugin}' failed: {message}.")]
    PluginExecution { plugin: String, message: String },

    /// Unknown or malformed protocol operation.
    #[error("Protocol error: {0}.")]
    Protocol(String),

    /// A single output file could not be rendered.
    #[error("Failed to render '{path}': {message}.")]
    Render { path: String, message: String },

    /// Writing the file set to disk failed. `pending` lists every path that
    /// was not written, the failing one included.
    #[error("Failed to write '{path}': {message} ({} path(s) not written).", .pending.len())]
    Commit { path: String, message: String, pending: Vec<String> },

    /// Plugins were requested but none of them could be resolved.
    #[error("None of the requested plugins could be resolved: {}.", .requested.join(", "))]
    NoPluginsResolved { requested: Vec<String> },

    #[error("Output directory '{output_dir}' already exists. Use --force to overwrite it.")]
    OutputDirectoryExists { output_dir: String },

    #[error("Template directory '{template_dir}' does not exist.")]
    TemplateDoesNotExist { template_dir: String },

    /// Configuration file could not be found or parsed.
    #[error("Configuration error: {0}.")]
    Config(String),

    /// Invalid input handed to the public API.
    #[error("Validation error: {0}.")]
    Validation(String),

    #[error("IO error: {0}.")]
    Io(#[from] std::io::Error),

    #[error("Template engine error: {0}.")]
    Minijinja(#[from] minijinja::Error),

    #[error("JSON error: {0}.")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Prints the error to stderr and exits with status code 1.
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
