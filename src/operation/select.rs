//! Output selection (`--Select` / `--PassThru`)
//!
//! The selection is resolved against the operation definition before any
//! call is made, so an invalid expression never reaches the service.

use crate::error::ShimError;
use crate::operation::context::InvocationContext;
use crate::operation::registry::OperationDef;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `*` - the whole response
    WholeResponse,
    /// A top-level response field
    NamedField(String),
    /// `^Param` - echo a parameter value instead of the response
    EchoInput(String),
}

impl Selection {
    /// Resolve the caller's choice. `--Select` and `--PassThru` are exclusive.
    pub fn resolve(op: &OperationDef, select: Option<&str>, passthru: bool) -> Result<Self, ShimError> {
        match (select, passthru) {
            (Some(_), true) => Err(ShimError::SelectionConflict),
            (None, true) => match &op.passthru {
                Some(param) => Ok(Selection::EchoInput(param.clone())),
                None => Err(ShimError::InvalidSelection {
                    expr: "--PassThru".to_string(),
                    reason: format!("operation '{}' has no pass-through parameter", op.name),
                }),
            },
            (Some(expr), false) => Self::parse(op, expr),
            (None, false) => Self::parse(op, &op.default_select),
        }
    }

    fn parse(op: &OperationDef, expr: &str) -> Result<Self, ShimError> {
        let expr = expr.trim();
        if expr == "*" {
            return Ok(Selection::WholeResponse);
        }

        if let Some(param) = expr.strip_prefix('^') {
            let def = op.find_param(param).ok_or_else(|| ShimError::InvalidSelection {
                expr: expr.to_string(),
                reason: format!("operation '{}' has no parameter named '{}'", op.name, param),
            })?;
            return Ok(Selection::EchoInput(def.name.clone()));
        }

        op.output_fields
            .iter()
            .find(|f| f.eq_ignore_ascii_case(expr))
            .map(|f| Selection::NamedField(f.clone()))
            .ok_or_else(|| ShimError::InvalidSelection {
                expr: expr.to_string(),
                reason: if op.output_fields.is_empty() {
                    "the response has no fields; use '*' or '^Parameter'".to_string()
                } else {
                    format!("expected '*', '^Parameter' or one of: {}", op.output_fields.join(", "))
                },
            })
    }

    /// Project a response (and the invocation's inputs) to the emitted value
    pub fn project(&self, response: &Value, ctx: &InvocationContext<'_>) -> Value {
        match self {
            Selection::WholeResponse => response.clone(),
            Selection::NamedField(field) => response.get(field).cloned().unwrap_or(Value::Null),
            Selection::EchoInput(param) => ctx.value(param).map(|v| v.to_json()).unwrap_or(Value::Null),
        }
    }

    pub fn field(&self) -> Option<&str> {
        match self {
            Selection::NamedField(field) => Some(field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::params::parse_args;
    use crate::operation::registry::{find_operation, registry};
    use serde_json::json;

    fn op(name: &str) -> &'static OperationDef {
        find_operation(registry().unwrap(), name).unwrap()
    }

    #[test]
    fn default_selection_comes_from_definition() {
        assert_eq!(Selection::resolve(op("invoke"), None, false).unwrap(), Selection::WholeResponse);
        assert_eq!(
            Selection::resolve(op("list-aliases"), None, false).unwrap(),
            Selection::NamedField("Aliases".to_string())
        );
    }

    #[test]
    fn select_and_passthru_conflict() {
        let err = Selection::resolve(op("invoke"), Some("StatusCode"), true).unwrap_err();
        assert!(matches!(err, ShimError::SelectionConflict));
    }

    #[test]
    fn passthru_echoes_the_configured_parameter() {
        assert_eq!(
            Selection::resolve(op("delete-alias"), None, true).unwrap(),
            Selection::EchoInput("Name".to_string())
        );
    }

    #[test]
    fn passthru_without_parameter_is_rejected() {
        assert!(Selection::resolve(op("get-account-settings"), None, true).is_err());
    }

    #[test]
    fn echo_resolves_aliases_to_canonical_name() {
        assert_eq!(
            Selection::resolve(op("invoke"), Some("^functionarn"), false).unwrap(),
            Selection::EchoInput("FunctionName".to_string())
        );
    }

    #[test]
    fn unknown_field_is_rejected_before_dispatch() {
        let err = Selection::resolve(op("invoke"), Some("Bogus"), false).unwrap_err();
        assert!(matches!(err, ShimError::InvalidSelection { .. }));
        assert!(err.to_string().contains("StatusCode"));
    }

    #[test]
    fn projection_reads_field_or_input() {
        let invoke = op("invoke");
        let tokens = vec!["--FunctionName".to_string(), "my-fn".to_string()];
        let ctx = InvocationContext::new(invoke, parse_args(invoke, &tokens).unwrap()).unwrap();
        let response = json!({ "StatusCode": 200, "Payload": "\"ok\"" });

        assert_eq!(Selection::WholeResponse.project(&response, &ctx), response);
        assert_eq!(Selection::NamedField("StatusCode".into()).project(&response, &ctx), json!(200));
        assert_eq!(Selection::NamedField("FunctionError".into()).project(&response, &ctx), Value::Null);
        assert_eq!(Selection::EchoInput("FunctionName".into()).project(&response, &ctx), json!("my-fn"));
    }
}
