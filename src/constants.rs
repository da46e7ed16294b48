//! Common constants used throughout kiln.

/// Supported generation config file names, tried in order.
pub const CONFIG_FILES: [&str; 3] = ["kiln.json", "kiln.yml", "kiln.yaml"];

/// Declarative plugin file names inside a plugin directory, tried in order.
pub const PLUGIN_FILES: [&str; 3] = ["generator.json", "generator.yaml", "generator.yml"];

/// Default directory name pattern for on-disk plugins.
pub const PLUGIN_DIR_PATTERN: &str = "plugin-{name}";

/// Default directory searched for on-disk plugins.
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Manifest written at the project root.
pub const MANIFEST_FILE: &str = "package.json";

/// Version used by `add_dependency` when none is given.
pub const DEFAULT_VERSION: &str = "latest";
