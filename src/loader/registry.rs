use std::rc::Rc;

use indexmap::IndexMap;

use crate::api::GeneratorApi;
use crate::error::{Error, Result};
use crate::loader::{ModuleResolver, Plugin};

/// In-process plugin table. Names are matched case-insensitively.
#[derive(Default)]
pub struct RegistryResolver {
    plugins: IndexMap<String, Rc<dyn Plugin>>,
}

impl RegistryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin value, replacing any previous one with that name.
    pub fn register(mut self, name: &str, plugin: impl Plugin + 'static) -> Self {
        self.plugins.insert(name.to_lowercase(), Rc::new(plugin));
        self
    }

    /// Registers a closure as a plugin.
    pub fn register_fn<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&mut GeneratorApi<'_>) -> anyhow::Result<()> + 'static,
    {
        self.register(name, f)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }
}

impl ModuleResolver for RegistryResolver {
    fn resolve(&self, name: &str) -> Result<Rc<dyn Plugin>> {
        self.plugins.get(&name.to_lowercase()).cloned().ok_or_else(|| Error::PluginResolution {
            plugin: name.to_string(),
            message: "not registered".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = RegistryResolver::new().register_fn("Pinia", |_api| Ok(()));
        assert!(registry.resolve("pinia").is_ok());
        assert!(registry.resolve("PINIA").is_ok());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["pinia"]);
    }

    #[test]
    fn test_unknown_plugin() {
        let registry = RegistryResolver::new();
        match registry.resolve("husky") {
            Err(Error::PluginResolution { plugin, .. }) => assert_eq!(plugin, "husky"),
            _ => panic!("Expected PluginResolution error"),
        }
    }
}
