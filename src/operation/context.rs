//! Invocation context: the resolved parameter values of one command run

use crate::error::ShimError;
use crate::operation::params::{convert, CommonParams, ParamValue, ParsedArgs, Tristate};
use crate::operation::registry::{OperationDef, ParamDef};
use crate::operation::select::Selection;
use tracing::debug;

/// One declared parameter and what the caller made of it
#[derive(Debug, Clone)]
pub struct ParamSlot<'a> {
    pub def: &'a ParamDef,
    pub value: Tristate<ParamValue>,
    /// True when the caller supplied the parameter (as opposed to a default)
    pub supplied: bool,
}

/// Created once per invocation, consumed when the request is built.
#[derive(Debug)]
pub struct InvocationContext<'a> {
    pub operation: &'a OperationDef,
    pub slots: Vec<ParamSlot<'a>>,
    pub selection: Selection,
    pub common: CommonParams,
}

impl<'a> InvocationContext<'a> {
    /// Validate required parameters, resolve the output selection, then
    /// convert supplied values and apply defaults.
    pub fn new(operation: &'a OperationDef, args: ParsedArgs) -> Result<Self, ShimError> {
        for def in operation.params.iter().filter(|p| p.required) {
            // Blank text counts as not supplied
            let supplied = args
                .raw
                .get(&def.name)
                .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
            if !supplied {
                return Err(ShimError::MissingParameter {
                    operation: operation.name.clone(),
                    param: def.name.clone(),
                });
            }
        }

        let selection = Selection::resolve(operation, args.common.select.as_deref(), args.common.passthru)?;

        let mut slots = Vec::with_capacity(operation.params.len());
        for def in &operation.params {
            let raw = args.raw.get(&def.name).map(Vec::as_slice).unwrap_or_default();
            let mut value = convert(def, raw)?;
            let supplied = !value.is_unset();

            if let (Tristate::Unset, Some(default)) = (&value, &def.default) {
                debug!("Applying default for {}: {}", def.name, default);
                value = convert(def, std::slice::from_ref(default))?;
            }

            slots.push(ParamSlot { def, value, supplied });
        }

        Ok(Self {
            operation,
            slots,
            selection,
            common: args.common,
        })
    }

    pub fn slot(&self, name: &str) -> Option<&ParamSlot<'a>> {
        self.slots.iter().find(|s| s.def.name == name)
    }

    /// Resolved value of a parameter (supplied or defaulted)
    pub fn value(&self, name: &str) -> Option<&ParamValue> {
        self.slot(name).and_then(|s| s.value.as_set())
    }

    /// True when the caller supplied the parameter explicitly
    pub fn supplied(&self, name: &str) -> bool {
        self.slot(name).is_some_and(|s| s.supplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::params::{parse_args, BlobSource};
    use crate::operation::registry::{find_operation, registry};
    use std::collections::BTreeMap;

    fn op(name: &str) -> &'static OperationDef {
        find_operation(registry().unwrap(), name).unwrap()
    }

    fn context(name: &str, tokens: &[&str]) -> Result<InvocationContext<'static>, ShimError> {
        let op = op(name);
        let tokens: Vec<String> = tokens.iter().map(|s| s.to_string()).collect();
        InvocationContext::new(op, parse_args(op, &tokens).unwrap())
    }

    fn raw(values: &[(&str, &str)]) -> ParsedArgs {
        let mut raw: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in values {
            raw.entry(name.to_string()).or_default().push(value.to_string());
        }
        ParsedArgs { raw, ..ParsedArgs::default() }
    }

    #[test]
    fn missing_required_parameter_is_reported_by_name() {
        let err = InvocationContext::new(op("create-alias"), raw(&[("FunctionName", "fn"), ("Name", "live")]))
            .unwrap_err();
        assert!(matches!(err, ShimError::MissingParameter { ref param, .. } if param == "FunctionVersion"));
    }

    #[test]
    fn blank_required_value_counts_as_missing() {
        for blank in ["", "   "] {
            let err = context("get-function", &["--FunctionName", blank]).unwrap_err();
            assert!(matches!(err, ShimError::MissingParameter { ref param, .. } if param == "FunctionName"));
        }
    }

    #[test]
    fn default_is_applied_but_not_marked_supplied() {
        let ctx = context("invoke", &["--FunctionName", "my-fn"]).unwrap();
        assert_eq!(ctx.value("Payload"), Some(&ParamValue::Blob(BlobSource::Inline("{}".to_string()))));
        assert!(!ctx.supplied("Payload"));
        assert!(ctx.supplied("FunctionName"));
    }

    #[test]
    fn unsupplied_optional_parameters_stay_unset() {
        let ctx = context("invoke", &["--FunctionName", "my-fn"]).unwrap();
        assert!(ctx.slot("Qualifier").unwrap().value.is_unset());
        assert_eq!(ctx.value("Qualifier"), None);
    }

    #[test]
    fn required_collection_cannot_be_empty() {
        let err = context("untag-resource", &["--Resource", "arn", "--TagKey", ""]).unwrap_err();
        assert!(matches!(err, ShimError::MissingParameter { ref param, .. } if param == "TagKey"));
    }
}
