//! Operation Registry - JSON-driven operation definitions
//!
//! Every Lambda operation lamctl exposes is described by a record in one of
//! the embedded `defs/*.json` files. The runner never contains per-operation
//! code: parameter names, aliases, request paths, defaults, required flags,
//! output fields and paging tokens all come from here.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Embedded definition files (name, contents)
const DEFINITION_FILES: &[(&str, &str)] = &[
    ("functions.json", include_str!("defs/functions.json")),
    ("aliases.json", include_str!("defs/aliases.json")),
    ("event_source_mappings.json", include_str!("defs/event_source_mappings.json")),
    ("permissions.json", include_str!("defs/permissions.json")),
    ("layers.json", include_str!("defs/layers.json")),
    ("account.json", include_str!("defs/account.json")),
    ("durable_executions.json", include_str!("defs/durable_executions.json")),
];

/// Parameter names every operation accepts in addition to its own.
pub const COMMON_PARAMS: &[&str] = &["Select", "PassThru", "Force", "NoAutoIteration", "Help"];

static REGISTRY: OnceLock<std::result::Result<Vec<OperationDef>, String>> = OnceLock::new();

/// How much confirmation an operation warrants. `None` marks read-only operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn label(self) -> &'static str {
        match self {
            Impact::None => "none",
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Double,
    Timestamp,
    StringList,
    StringMap,
    DoubleMap,
    /// Inline text, or `file://path` to read the text from a file
    TextBlob,
    /// Path of a file read as raw bytes
    FileBlob,
}

impl ParamKind {
    pub fn is_collection(self) -> bool {
        matches!(self, ParamKind::StringList | ParamKind::StringMap | ParamKind::DoubleMap)
    }

    /// Value name shown in operation help
    pub fn placeholder(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "int",
            ParamKind::Boolean => "true|false",
            ParamKind::Double => "number",
            ParamKind::Timestamp => "rfc3339",
            ParamKind::StringList => "value,...",
            ParamKind::StringMap => "key=value,...",
            ParamKind::DoubleMap => "key=number,...",
            ParamKind::TextBlob => "text|file://path",
            ParamKind::FileBlob => "path",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamDef {
    /// Canonical parameter name (e.g., "VpcConfig_SubnetId")
    pub name: String,
    /// Dotted request path (e.g., "VpcConfig.SubnetIds")
    pub target: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    /// Value used when the caller does not supply the parameter
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// An explicitly empty value is sent as an empty collection
    #[serde(default)]
    pub clearable: bool,
    /// List values are split on commas. Off for values that contain commas
    /// themselves, such as JSON filter patterns.
    #[serde(default = "default_split")]
    pub split: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_split() -> bool {
    true
}

impl ParamDef {
    /// Case-insensitive match against the name and aliases
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }
}

/// Page size is enforced locally (legacy) or passed to the service per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageCap {
    Client,
    Service,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaginationDef {
    /// Request parameter carrying the starting marker
    pub input_token: String,
    /// Response field carrying the next marker
    pub output_token: String,
    /// Response field holding the page's items
    pub items: String,
    #[serde(default)]
    pub limit_param: Option<String>,
    pub cap: PageCap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationDef {
    /// Command name (e.g., "list-aliases")
    pub name: String,
    /// Remote operation name (e.g., "ListAliases")
    pub api: String,
    pub description: String,
    #[serde(default)]
    pub impact: Impact,
    #[serde(default = "default_select")]
    pub default_select: String,
    /// Parameter echoed by --PassThru
    #[serde(default)]
    pub passthru: Option<String>,
    #[serde(default)]
    pub output_fields: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamDef>,
    #[serde(default)]
    pub pagination: Option<PaginationDef>,
}

fn default_select() -> String {
    "*".to_string()
}

impl OperationDef {
    pub fn is_mutating(&self) -> bool {
        self.impact != Impact::None
    }

    /// Find a parameter by name or alias (case-insensitive)
    pub fn find_param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.matches(name))
    }

    pub fn has_output_field(&self, field: &str) -> bool {
        self.output_fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Deserialize)]
struct DefinitionFile {
    operations: Vec<OperationDef>,
}

/// Get the embedded operation catalogue, parsed and validated once
pub fn registry() -> Result<&'static [OperationDef]> {
    let loaded = REGISTRY.get_or_init(|| load_definitions(DEFINITION_FILES).map_err(|e| format!("{e:#}")));
    match loaded {
        Ok(ops) => Ok(ops.as_slice()),
        Err(e) => Err(anyhow!("invalid operation definitions: {}", e)),
    }
}

/// Look up an operation by command name (case-insensitive)
pub fn find_operation<'a>(registry: &'a [OperationDef], name: &str) -> Option<&'a OperationDef> {
    registry.iter().find(|op| op.name.eq_ignore_ascii_case(name))
}

/// Parse and validate a set of definition files
pub fn load_definitions(files: &[(&str, &str)]) -> Result<Vec<OperationDef>> {
    let mut operations = Vec::new();
    let mut names = HashSet::new();

    for (file, contents) in files {
        let parsed: DefinitionFile =
            serde_json::from_str(contents).with_context(|| format!("failed to parse {}", file))?;

        for op in parsed.operations {
            validate_operation(&op).with_context(|| format!("{}: operation '{}'", file, op.name))?;
            if !names.insert(op.name.to_lowercase()) {
                return Err(anyhow!("{}: duplicate operation '{}'", file, op.name));
            }
            operations.push(op);
        }
    }

    tracing::debug!("Loaded {} operation definitions", operations.len());
    Ok(operations)
}

fn validate_operation(op: &OperationDef) -> Result<()> {
    let mut seen: HashSet<String> = COMMON_PARAMS.iter().map(|n| n.to_lowercase()).collect();

    for param in &op.params {
        for name in std::iter::once(&param.name).chain(param.aliases.iter()) {
            if !seen.insert(name.to_lowercase()) {
                return Err(anyhow!("parameter name '{}' is ambiguous", name));
            }
        }
        if param.required && param.default.is_some() {
            return Err(anyhow!("required parameter '{}' cannot have a default", param.name));
        }
        if param.clearable && !param.kind.is_collection() {
            return Err(anyhow!("only list and map parameters can be clearable ('{}')", param.name));
        }
        if !param.split && param.kind != ParamKind::StringList {
            return Err(anyhow!("only list parameters can turn off comma splitting ('{}')", param.name));
        }
        if param.target.is_empty() || param.target.split('.').any(str::is_empty) {
            return Err(anyhow!("parameter '{}' has an invalid target '{}'", param.name, param.target));
        }
    }

    if op.default_select != "*" && !op.has_output_field(&op.default_select) {
        return Err(anyhow!("default_select '{}' is not an output field", op.default_select));
    }

    if let Some(passthru) = &op.passthru {
        if !op.params.iter().any(|p| &p.name == passthru) {
            return Err(anyhow!("passthru parameter '{}' does not exist", passthru));
        }
    }

    if let Some(page) = &op.pagination {
        let token_param = op
            .params
            .iter()
            .find(|p| p.name == page.input_token)
            .ok_or_else(|| anyhow!("pagination input token '{}' is not a parameter", page.input_token))?;
        if token_param.kind != ParamKind::String {
            return Err(anyhow!("pagination input token '{}' must be a string", page.input_token));
        }
        for field in [&page.output_token, &page.items] {
            if !op.has_output_field(field) {
                return Err(anyhow!("pagination field '{}' is not an output field", field));
            }
        }
        if let Some(limit) = &page.limit_param {
            let limit_param = op
                .params
                .iter()
                .find(|p| &p.name == limit)
                .ok_or_else(|| anyhow!("pagination limit '{}' is not a parameter", limit))?;
            if limit_param.kind != ParamKind::Integer {
                return Err(anyhow!("pagination limit '{}' must be an integer", limit));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_definitions_are_valid() {
        let ops = load_definitions(DEFINITION_FILES).expect("embedded definitions should load");
        assert!(ops.len() >= 30);
        assert!(find_operation(&ops, "invoke").is_some());
        assert!(find_operation(&ops, "LIST-ALIASES").is_some());
    }

    #[test]
    fn every_paginated_operation_is_read_only() {
        let ops = load_definitions(DEFINITION_FILES).unwrap();
        for op in ops.iter().filter(|op| op.pagination.is_some()) {
            assert_eq!(op.impact, Impact::None, "{} should be read-only", op.name);
        }
    }

    #[test]
    fn invoke_payload_defaults_to_empty_json_object() {
        let ops = load_definitions(DEFINITION_FILES).unwrap();
        let invoke = find_operation(&ops, "invoke").unwrap();
        let payload = invoke.find_param("payload").unwrap();
        assert_eq!(payload.default.as_deref(), Some("{}"));
        assert_eq!(payload.kind, ParamKind::TextBlob);
    }

    #[test]
    fn aliases_resolve_to_nested_targets() {
        let ops = load_definitions(DEFINITION_FILES).unwrap();
        let create = find_operation(&ops, "create-function").unwrap();
        let subnets = create.find_param("SubnetId").unwrap();
        assert_eq!(subnets.name, "VpcConfig_SubnetId");
        assert_eq!(subnets.target, "VpcConfig.SubnetIds");
    }

    #[test]
    fn ambiguous_alias_is_rejected() {
        let defs = r#"{ "operations": [ {
            "name": "get-thing", "api": "GetThing", "description": "",
            "params": [
                { "name": "FunctionName", "target": "FunctionName", "kind": "string" },
                { "name": "Other", "target": "Other", "kind": "string", "aliases": ["functionname"] }
            ]
        } ] }"#;
        let err = load_definitions(&[("bad.json", defs)]).unwrap_err();
        assert!(format!("{err:#}").contains("ambiguous"));
    }

    #[test]
    fn common_parameter_names_are_reserved() {
        let defs = r#"{ "operations": [ {
            "name": "get-thing", "api": "GetThing", "description": "",
            "params": [ { "name": "Select", "target": "Select", "kind": "string" } ]
        } ] }"#;
        assert!(load_definitions(&[("bad.json", defs)]).is_err());
    }

    #[test]
    fn unknown_default_select_is_rejected() {
        let defs = r#"{ "operations": [ {
            "name": "get-thing", "api": "GetThing", "description": "",
            "default_select": "Missing", "output_fields": ["Thing"]
        } ] }"#;
        let err = load_definitions(&[("bad.json", defs)]).unwrap_err();
        assert!(format!("{err:#}").contains("default_select"));
    }

    #[test]
    fn filter_patterns_are_not_split() {
        let ops = load_definitions(DEFINITION_FILES).unwrap();
        for name in ["create-event-source-mapping", "update-event-source-mapping"] {
            let filter = find_operation(&ops, name).unwrap().find_param("Filter").unwrap();
            assert!(!filter.split, "{} splits filter patterns", name);
        }
        let layers = find_operation(&ops, "create-function").unwrap().find_param("Layers").unwrap();
        assert!(layers.split);
    }

    #[test]
    fn split_flag_is_only_for_lists() {
        let defs = r#"{ "operations": [ {
            "name": "get-thing", "api": "GetThing", "description": "",
            "params": [ { "name": "Name", "target": "Name", "kind": "string", "split": false } ]
        } ] }"#;
        let err = load_definitions(&[("bad.json", defs)]).unwrap_err();
        assert!(format!("{err:#}").contains("comma splitting"));
    }

    #[test]
    fn impact_levels_are_ordered() {
        assert!(Impact::High > Impact::Medium);
        assert!(Impact::Medium > Impact::Low);
        assert!(Impact::Low > Impact::None);
    }
}
