use serde_json::Value;

use super::LoadError;

/// Analysis result as produced by the backend: modules, their top-level
/// declarations, and the calls each declaration makes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceDocument {
    pub modules: Vec<ModuleEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModuleEntry {
    pub module: String,
    pub declarations: Vec<Declaration>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub kind: String,
    pub calls: Vec<CallReference>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallReference {
    pub function: String,
}

const DEFAULT_DECLARATION_KIND: &str = "declaration";

impl SourceDocument {
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn from_value(value: &Value) -> Result<Self, LoadError> {
        let body = value
            .get("dependencies")
            .filter(|inner| inner.get("modules").is_some())
            .unwrap_or(value);

        let modules = body
            .get("modules")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                LoadError::Shape("expected a `modules` array (optionally under `dependencies`)".into())
            })?;

        let modules = modules.iter().filter_map(parse_module).collect();
        Ok(Self { modules })
    }
}

pub fn parse_document(raw: &str) -> Result<SourceDocument, LoadError> {
    let parsed: Value = serde_json::from_str(raw)?;
    SourceDocument::from_value(&parsed)
}

fn parse_module(value: &Value) -> Option<ModuleEntry> {
    let Some(module) = value.get("module").and_then(Value::as_str) else {
        tracing::debug!("skipping module entry without a `module` identifier");
        return None;
    };

    let declarations = value
        .get("tree")
        .and_then(|tree| tree.get("children"))
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter_map(|child| parse_declaration(module, child))
                .collect()
        })
        .unwrap_or_default();

    Some(ModuleEntry {
        module: module.to_owned(),
        declarations,
    })
}

fn parse_declaration(module: &str, value: &Value) -> Option<Declaration> {
    let Some(name) = value.get("name").and_then(Value::as_str) else {
        tracing::debug!(module, "skipping declaration without a name");
        return None;
    };

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DECLARATION_KIND)
        .to_owned();

    let calls = value
        .get("calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let function = call.get("function").and_then(Value::as_str);
                    if function.is_none() {
                        tracing::trace!(module, declaration = name, "skipping call without a target");
                    }
                    function.map(|function| CallReference {
                        function: function.to_owned(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Declaration {
        name: name.to_owned(),
        kind,
        calls,
    })
}
