//! kiln is a plugin-driven project scaffolding generator.
//! Plugins contribute manifest fragments, config-file fragments and
//! declarative protocol operations; kiln reconciles them, renders the
//! template tree and writes the project in one batch.

/// Per-plugin recording surface (`GeneratorApi`)
pub mod api;

/// Command-line interface module for the kiln binary
pub mod cli;

/// Run configuration handling
/// Supports JSON and YAML formats (kiln.json, kiln.yml, kiln.yaml)
pub mod config;

/// Common constants
pub mod constants;

/// Contribution records and manifest merge rules
pub mod contribution;

/// Error types and handling
pub mod error;

/// Plugin orchestration
pub mod generator;

/// Import insertion into source files
pub mod imports;

/// Plugin contract and resolvers
pub mod loader;

/// Logger initialisation
pub mod logger;

/// Template-tree rendering and protocol resolution
pub mod processor;

/// User confirmation handling
pub mod prompt;

/// Protocol operation vocabulary
pub mod protocol;

/// Template engine seam
pub mod renderer;

/// Batch writing of the generated file set
pub mod writer;

pub use api::GeneratorApi;
pub use error::{Error, Result};
pub use generator::{Generation, Generator, PluginSpec, Stage};
pub use loader::{ChainResolver, DirectoryResolver, ModuleResolver, Plugin, RegistryResolver};
pub use protocol::{FileContent, ImportSpec, Protocol};
