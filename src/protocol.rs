//! The closed vocabulary of operations a plugin can request.
//!
//! Plugins never touch the file map themselves. They describe what they want
//! as a [`Protocol`] value and the processor resolves all of them centrally,
//! after every plugin has run.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Kinds of protocol operations, with their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    RenderFile,
    InsertImport,
}

impl ProtocolKind {
    pub const ALL: [ProtocolKind; 2] = [ProtocolKind::RenderFile, ProtocolKind::InsertImport];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolKind::RenderFile => "RENDER_FILE",
            ProtocolKind::InsertImport => "INSERT_IMPORT",
        }
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolKind {
    type Err = Error;

    /// Accepts `RENDER_FILE` as well as the `RENDER_FILE_PROTOCOL` spelling.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.strip_suffix("_PROTOCOL").unwrap_or(s);
        ProtocolKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| Error::Protocol(format!("unknown protocol kind '{s}'")))
    }
}

/// Renders file content from the generation context.
type RenderFn = dyn Fn(&serde_json::Value) -> anyhow::Result<String>;

/// A plugin-supplied content function for `RENDER_FILE`.
#[derive(Clone)]
pub struct CustomRenderer(Arc<RenderFn>);

impl CustomRenderer {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&serde_json::Value) -> anyhow::Result<String> + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn render(&self, context: &serde_json::Value) -> anyhow::Result<String> {
        (self.0)(context)
    }
}

impl fmt::Debug for CustomRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRenderer(..)")
    }
}

/// Content of a file declared through `RENDER_FILE`.
#[derive(Debug, Clone)]
pub enum FileContent {
    /// Template source, rendered against the generation context.
    Template(String),
    /// Content computed by the plugin at render time.
    Custom(CustomRenderer),
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        FileContent::Template(s.to_string())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        FileContent::Template(s)
    }
}

/// One import to insert into a source file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportSpec {
    /// Target file, with or without its extension (`src/main`).
    pub dir: String,
    /// Imported binding, written as-is (`{ createPinia }`).
    pub name: String,
    /// Module specifier (`pinia`).
    pub from: String,
}

impl ImportSpec {
    pub fn new(dir: impl Into<String>, name: impl Into<String>, from: impl Into<String>) -> Self {
        Self { dir: dir.into(), name: name.into(), from: from.into() }
    }

    /// The statement inserted into the target file.
    pub fn statement(&self) -> String {
        format!("import {} from \"{}\";", self.name, self.from)
    }
}

/// A declarative operation requested by a plugin.
#[derive(Debug, Clone)]
pub enum Protocol {
    RenderFile { files: IndexMap<String, FileContent> },
    InsertImport { imports: Vec<ImportSpec> },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOp<P> {
    params: P,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RenderFileParams {
    files: IndexMap<String, String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct InsertImportParams {
    imports: Vec<ImportSpec>,
}

impl Protocol {
    pub fn kind(&self) -> ProtocolKind {
        match self {
            Protocol::RenderFile { .. } => ProtocolKind::RenderFile,
            Protocol::InsertImport { .. } => ProtocolKind::InsertImport,
        }
    }

    /// Shorthand for a `RENDER_FILE` of a single template.
    pub fn render_file(path: impl Into<String>, content: impl Into<FileContent>) -> Self {
        let mut files = IndexMap::new();
        files.insert(path.into(), content.into());
        Protocol::RenderFile { files }
    }

    /// Shorthand for an `INSERT_IMPORT` of a single import.
    pub fn insert_import(spec: ImportSpec) -> Self {
        Protocol::InsertImport { imports: vec![spec] }
    }

    /// Parses one operation from its kind name and `{ "params": ... }` body.
    pub fn from_json(kind: &str, body: &serde_json::Value) -> Result<Self> {
        let kind: ProtocolKind = kind.parse()?;
        let malformed =
            |e: serde_json::Error| Error::Protocol(format!("malformed {kind} operation: {e}"));
        match kind {
            ProtocolKind::RenderFile => {
                let raw: RawOp<RenderFileParams> =
                    serde_json::from_value(body.clone()).map_err(malformed)?;
                let files = raw
                    .params
                    .files
                    .into_iter()
                    .map(|(path, content)| (path, FileContent::Template(content)))
                    .collect();
                Ok(Protocol::RenderFile { files })
            }
            ProtocolKind::InsertImport => {
                let raw: RawOp<InsertImportParams> =
                    serde_json::from_value(body.clone()).map_err(malformed)?;
                Ok(Protocol::InsertImport { imports: raw.params.imports })
            }
        }
    }

    /// Parses raw operations: an object `{ KIND: { params } }` with one or
    /// more kinds, or an array of such objects.
    ///
    /// Well-formed operations are returned in declaration order next to one
    /// error per entry that was rejected.
    pub fn parse_ops(value: &serde_json::Value) -> (Vec<Protocol>, Vec<Error>) {
        let mut ops = Vec::new();
        let mut errors = Vec::new();

        let groups: Vec<&serde_json::Value> = match value {
            serde_json::Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        for group in groups {
            let Some(entries) = group.as_object() else {
                errors.push(Error::Protocol(format!(
                    "expected an object of protocol operations, got {group}"
                )));
                continue;
            };
            for (kind, body) in entries {
                match Protocol::from_json(kind, body) {
                    Ok(op) => ops.push(op),
                    Err(e) => errors.push(e),
                }
            }
        }

        (ops, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_accepts_protocol_suffix() {
        assert_eq!(
            "INSERT_IMPORT_PROTOCOL".parse::<ProtocolKind>().unwrap(),
            ProtocolKind::InsertImport
        );
        assert_eq!("RENDER_FILE".parse::<ProtocolKind>().unwrap(), ProtocolKind::RenderFile);
        assert!("DELETE_FILE".parse::<ProtocolKind>().is_err());
    }

    #[test]
    fn test_parse_ops_keeps_valid_siblings() {
        let raw = json!([
            { "INSERT_IMPORT_PROTOCOL": { "params": { "imports": [
                { "dir": "src/main", "name": "{ createPinia }", "from": "pinia" }
            ] } } },
            { "DELETE_FILE": { "params": {} } },
            { "RENDER_FILE": { "params": { "files": { ".npmrc": "registry={{ options.registry }}" } } } }
        ]);

        let (ops, errors) = Protocol::parse_ops(&raw);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("DELETE_FILE"));
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind(), ProtocolKind::InsertImport);
        assert_eq!(ops[1].kind(), ProtocolKind::RenderFile);
    }

    #[test]
    fn test_malformed_params_are_rejected() {
        let raw = json!({ "INSERT_IMPORT": { "params": { "imports": [{ "dir": "src/main" }] } } });
        let (ops, errors) = Protocol::parse_ops(&raw);
        assert!(ops.is_empty());
        assert!(matches!(errors[0], Error::Protocol(ref msg) if msg.contains("malformed")));
    }

    #[test]
    fn test_import_statement() {
        let spec = ImportSpec::new("src/main", "{ createPinia }", "pinia");
        assert_eq!(spec.statement(), "import { createPinia } from \"pinia\";");
    }
}
