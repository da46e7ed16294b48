//! Template rendering engine seam for kiln.
//! Template files, `RENDER_FILE` content and declarative plugin strings all go
//! through a [`TemplateRenderer`]; the default implementation uses MiniJinja.
use crate::error::{Error, Result};
use minijinja::{Environment, UndefinedBehavior};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `name` - Name used in error messages (usually the output path)
    /// * `template` - Template source to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, name: &str, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// MiniJinja environment instance
    env: Environment<'static>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer that treats unknown variables as empty.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Creates a renderer that fails on any unresolved variable.
    pub fn strict() -> Self {
        let mut renderer = Self::new();
        renderer.env.set_undefined_behavior(UndefinedBehavior::Strict);
        renderer
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::Minijinja` if the template does not parse or rendering
    ///   fails (for instance an undefined variable in strict mode)
    fn render(&self, name: &str, template: &str, context: &serde_json::Value) -> Result<String> {
        let tmpl = self.env.template_from_named_str(name, template).map_err(Error::Minijinja)?;
        tmpl.render(context).map_err(Error::Minijinja)
    }
}

/// Renders every string leaf of `value` as a template.
///
/// Arrays and objects are processed recursively, other values are returned
/// as-is. Object keys are rendered too so patterns such as
/// `"{{ options.glob }}": [...]` work.
pub fn render_value(
    engine: &dyn TemplateRenderer,
    name: &str,
    value: &serde_json::Value,
    context: &serde_json::Value,
) -> Result<serde_json::Value> {
    match value {
        serde_json::Value::String(s) => {
            Ok(serde_json::Value::String(engine.render(name, s, context)?))
        }
        serde_json::Value::Array(arr) => arr
            .iter()
            .map(|item| render_value(engine, name, item, context))
            .collect::<Result<Vec<_>>>()
            .map(serde_json::Value::Array),
        serde_json::Value::Object(obj) => {
            let mut processed = serde_json::Map::new();
            for (k, v) in obj {
                let key = engine.render(name, k, context)?;
                processed.insert(key, render_value(engine, name, v, context)?);
            }
            Ok(serde_json::Value::Object(processed))
        }
        _ => Ok(value.clone()),
    }
}
