//! Plugin contract and plugin resolution.
//!
//! Where a plugin comes from is a configuration value: the generator is handed
//! a [`ModuleResolver`] at construction time and asks it for each selected
//! plugin by name.

use std::rc::Rc;

use crate::api::GeneratorApi;
use crate::error::{Error, Result};

pub mod directory;
pub mod registry;

pub use directory::{DeclarativePlugin, DirectoryResolver};
pub use registry::RegistryResolver;

/// A unit of generation logic contributing to the project.
pub trait Plugin {
    /// Records this plugin's contribution through `api`.
    ///
    /// Returning an error discards everything the plugin recorded.
    fn generate(&self, api: &mut GeneratorApi<'_>) -> anyhow::Result<()>;
}

impl<F> Plugin for F
where
    F: Fn(&mut GeneratorApi<'_>) -> anyhow::Result<()>,
{
    fn generate(&self, api: &mut GeneratorApi<'_>) -> anyhow::Result<()> {
        self(api)
    }
}

/// Locates plugins by name.
pub trait ModuleResolver {
    /// Resolves the plugin called `name`.
    ///
    /// # Errors
    /// * `Error::PluginResolution` if the plugin cannot be found or loaded
    fn resolve(&self, name: &str) -> Result<Rc<dyn Plugin>>;
}

/// Tries several resolvers in order; the first success wins.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn ModuleResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl ModuleResolver for ChainResolver {
    fn resolve(&self, name: &str) -> Result<Rc<dyn Plugin>> {
        let mut reasons = Vec::new();
        for resolver in &self.resolvers {
            match resolver.resolve(name) {
                Ok(plugin) => return Ok(plugin),
                Err(Error::PluginResolution { message, .. }) => reasons.push(message),
                Err(other) => reasons.push(other.to_string()),
            }
        }
        if reasons.is_empty() {
            reasons.push("no resolvers configured".to_string());
        }
        Err(Error::PluginResolution { plugin: name.to_string(), message: reasons.join("; ") })
    }
}
