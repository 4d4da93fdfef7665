//! Command-line parameter parsing
//!
//! Each operation becomes a clap subcommand built from its definition. The
//! raw strings clap collects are then converted into typed values here.

use crate::error::ShimError;
use crate::operation::registry::{OperationDef, ParamDef, ParamKind};
use aws_smithy_types::date_time::{DateTime, Format};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Three-way state of an optional field.
///
/// `Empty` is only produced for clearable collections: the field is sent as
/// an empty list or map so the service clears its stored value, whereas
/// `Unset` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Tristate<T> {
    #[default]
    Unset,
    Empty,
    Set(T),
}

impl<T> Tristate<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Tristate::Unset)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Tristate::Set(value) => Some(value),
            _ => None,
        }
    }
}

/// Where the bytes of a blob parameter come from
#[derive(Debug, Clone, PartialEq)]
pub enum BlobSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    Double(f64),
    /// RFC 3339 text, validated at parse time
    Timestamp(String),
    StringList(Vec<String>),
    StringMap(BTreeMap<String, String>),
    DoubleMap(BTreeMap<String, f64>),
    Blob(BlobSource),
}

impl ParamValue {
    /// JSON form placed in the request tree (blobs travel separately)
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::String(s) | ParamValue::Timestamp(s) => json!(s),
            ParamValue::Integer(n) => json!(n),
            ParamValue::Boolean(b) => json!(b),
            ParamValue::Double(d) => json!(d),
            ParamValue::StringList(items) => json!(items),
            ParamValue::StringMap(map) => json!(map),
            ParamValue::DoubleMap(map) => json!(map),
            ParamValue::Blob(BlobSource::Inline(text)) => json!(text),
            ParamValue::Blob(BlobSource::File(path)) => json!(path.display().to_string()),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

/// Options every operation accepts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonParams {
    pub select: Option<String>,
    pub passthru: bool,
    pub force: bool,
    pub no_auto_iteration: bool,
}

/// Parameters as supplied on the command line, keyed by canonical name
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    pub raw: BTreeMap<String, Vec<String>>,
    pub common: CommonParams,
}

impl ParsedArgs {
    /// Collect the raw values of an operation's subcommand matches.
    pub fn from_matches(op: &OperationDef, matches: &ArgMatches) -> Self {
        let raw = op
            .params
            .iter()
            .filter_map(|def| {
                let values = matches.get_many::<String>(&def.name)?;
                Some((def.name.clone(), values.cloned().collect()))
            })
            .collect();

        Self {
            raw,
            common: CommonParams {
                select: matches.get_one::<String>("Select").cloned(),
                passthru: matches.get_flag("PassThru"),
                force: matches.get_flag("Force"),
                no_auto_iteration: matches.get_flag("NoAutoIteration"),
            },
        }
    }
}

/// Parse the tokens that follow an operation name.
#[cfg(test)]
pub fn parse_args(op: &OperationDef, tokens: &[String]) -> Result<ParsedArgs, clap::Error> {
    let matches = operation_command(op)
        .no_binary_name(true)
        .try_get_matches_from(tokens)?;
    Ok(ParsedArgs::from_matches(op, &matches))
}

/// Build the subcommand for one operation.
///
/// Parameters take `--Name value` or `--Name=value`, under their declared
/// names, their aliases, or the all-lowercase spelling of either.
pub fn operation_command(op: &OperationDef) -> Command {
    let mut after_help = format!("Remote operation: {} (impact: {})", op.api, op.impact.label());
    after_help.push_str(&format!("\nDefault selection: {}", op.default_select));
    if let Some(paging) = &op.pagination {
        after_help.push_str(&format!(
            "\nPaginated on {}; pass --{} to fetch a single page, or --NoAutoIteration.",
            paging.items, paging.input_token
        ));
    }

    Command::new(op.name.clone())
        .about(op.description.clone())
        .after_help(after_help)
        .args(op.params.iter().map(param_arg))
        .arg(
            Arg::new("Select")
                .long("Select")
                .alias("select")
                .value_name("*|Field|^Param")
                .help("What to output: the whole response, one field, or ^ and a parameter name"),
        )
        .arg(switch("PassThru", "Output the value of the operation's main parameter"))
        .arg(switch("Force", "Skip the confirmation prompt"))
        .arg(switch("NoAutoIteration", "Fetch a single page of a paginated operation"))
}

fn switch(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .alias(name.to_ascii_lowercase())
        .action(ArgAction::SetTrue)
        .help(help)
}

fn param_arg(def: &ParamDef) -> Arg {
    let mut notes = Vec::new();
    if def.required {
        notes.push("required".to_string());
    }
    if let Some(default) = &def.default {
        notes.push(format!("default: {}", default));
    }
    if def.clearable {
        notes.push("pass \"\" to clear".to_string());
    }
    let mut help = def.description.clone().unwrap_or_default();
    if !notes.is_empty() {
        help = format!("{} [{}]", help, notes.join("; ")).trim_start().to_string();
    }

    let lowercase: Vec<String> = std::iter::once(&def.name)
        .chain(def.aliases.iter())
        .filter(|name| name.chars().any(|c| c.is_ascii_uppercase()))
        .map(|name| name.to_ascii_lowercase())
        .collect();

    let arg = Arg::new(def.name.clone())
        .long(def.name.clone())
        .visible_aliases(def.aliases.clone())
        .aliases(lowercase)
        .value_name(def.kind.placeholder())
        .required(def.required)
        .help(help);

    match def.kind {
        ParamKind::Boolean => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .default_missing_value("true"),
        ParamKind::Integer | ParamKind::Double => arg.action(ArgAction::Set).allow_negative_numbers(true),
        kind if kind.is_collection() => arg.action(ArgAction::Append),
        _ => arg.action(ArgAction::Set),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Convert the raw strings supplied for one parameter into its typed value.
pub fn convert(def: &ParamDef, raw: &[String]) -> Result<Tristate<ParamValue>, ShimError> {
    let invalid = |reason: String| ShimError::InvalidValue {
        param: def.name.clone(),
        reason,
    };

    let Some(first) = raw.first() else {
        return Ok(Tristate::Unset);
    };

    let value = match def.kind {
        ParamKind::String => ParamValue::String(first.clone()),
        ParamKind::Integer => ParamValue::Integer(i64::from(
            first
                .trim()
                .parse::<i32>()
                .map_err(|_| invalid(format!("'{}' is not a 32-bit integer", first)))?,
        )),
        ParamKind::Double => ParamValue::Double(
            first.trim().parse().map_err(|_| invalid(format!("'{}' is not a number", first)))?,
        ),
        ParamKind::Boolean => {
            ParamValue::Boolean(parse_bool(first).ok_or_else(|| invalid(format!("'{}' is not true or false", first)))?)
        }
        ParamKind::Timestamp => {
            DateTime::from_str(first, Format::DateTime)
                .map_err(|e| invalid(format!("'{}' is not an RFC 3339 timestamp: {}", first, e)))?;
            ParamValue::Timestamp(first.clone())
        }
        ParamKind::TextBlob => match first.strip_prefix("file://") {
            Some(path) => ParamValue::Blob(BlobSource::File(PathBuf::from(path))),
            None => ParamValue::Blob(BlobSource::Inline(first.clone())),
        },
        ParamKind::FileBlob => {
            let path = first
                .strip_prefix("fileb://")
                .or_else(|| first.strip_prefix("file://"))
                .unwrap_or(first);
            if path.is_empty() {
                return Err(invalid("expects a file path".to_string()));
            }
            ParamValue::Blob(BlobSource::File(PathBuf::from(path)))
        }
        ParamKind::StringList | ParamKind::StringMap | ParamKind::DoubleMap => {
            return convert_collection(def, raw);
        }
    };
    Ok(Tristate::Set(value))
}

/// Lists and maps: repeated flags and comma-separated values accumulate.
fn convert_collection(def: &ParamDef, raw: &[String]) -> Result<Tristate<ParamValue>, ShimError> {
    let invalid = |reason: String| ShimError::InvalidValue {
        param: def.name.clone(),
        reason,
    };

    let items: Vec<String> = raw
        .iter()
        .flat_map(|v| match def.kind {
            ParamKind::StringList if def.split => v.split(',').map(str::to_string).collect(),
            ParamKind::StringList => vec![v.clone()],
            _ => map_entries(v),
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        if def.clearable {
            return Ok(Tristate::Empty);
        }
        return Err(invalid("expects at least one value".to_string()));
    }
    let value = match def.kind {
        ParamKind::StringList => ParamValue::StringList(items),
        ParamKind::StringMap => {
            let mut map = BTreeMap::new();
            for item in &items {
                let (k, v) = split_pair(item).ok_or_else(|| invalid(format!("'{}' is not key=value", item)))?;
                map.insert(k.to_string(), v.to_string());
            }
            ParamValue::StringMap(map)
        }
        _ => {
            let mut map = BTreeMap::new();
            for item in &items {
                let (k, v) = split_pair(item).ok_or_else(|| invalid(format!("'{}' is not key=number", item)))?;
                let weight: f64 = v.parse().map_err(|_| invalid(format!("'{}' is not a number", v)))?;
                map.insert(k.to_string(), weight);
            }
            ParamValue::DoubleMap(map)
        }
    };
    Ok(Tristate::Set(value))
}

/// Split `k=v,k=v` on commas. A segment without `=` continues the previous
/// value, so `HOSTS=a,b` stays one entry.
fn map_entries(value: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();
    for segment in value.split(',') {
        if segment.trim().is_empty() {
            continue;
        }
        match entries.last_mut() {
            Some(last) if !segment.contains('=') => {
                last.push(',');
                last.push_str(segment);
            }
            _ => entries.push(segment.to_string()),
        }
    }
    entries
}

fn split_pair(item: &str) -> Option<(&str, &str)> {
    let (k, v) = item.split_once('=')?;
    let k = k.trim();
    if k.is_empty() {
        return None;
    }
    Some((k, v.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::registry::{find_operation, registry};
    use clap::error::ErrorKind;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn op(name: &str) -> &'static OperationDef {
        find_operation(registry().unwrap(), name).unwrap()
    }

    #[test]
    fn every_operation_builds_a_valid_subcommand() {
        for def in registry().unwrap() {
            operation_command(def).debug_assert();
        }
    }

    #[test]
    fn names_aliases_and_lowercase_spellings_resolve() {
        let parsed = parse_args(
            op("create-function"),
            &args(&["--functionname", "fn", "--Role=arn:aws:iam::1:role/r", "--SubnetId", "subnet-1", "--Runtime", "python3.12"]),
        )
        .unwrap();
        assert_eq!(parsed.raw["FunctionName"], vec!["fn"]);
        assert_eq!(parsed.raw["Role"], vec!["arn:aws:iam::1:role/r"]);
        assert_eq!(parsed.raw["VpcConfig_SubnetId"], vec!["subnet-1"]);
    }

    #[test]
    fn boolean_switch_takes_optional_value() {
        let parsed = parse_args(
            op("update-function-code"),
            &args(&["--FunctionName", "fn", "--Publish", "--DryRun", "false"]),
        )
        .unwrap();
        assert_eq!(parsed.raw["Publish"], vec!["true"]);
        assert_eq!(parsed.raw["DryRun"], vec!["false"]);
    }

    #[test]
    fn common_parameters_are_recognized() {
        let parsed = parse_args(
            op("list-aliases"),
            &args(&["--FunctionName", "fn", "--Select", "*", "--NoAutoIteration", "--force"]),
        )
        .unwrap();
        assert_eq!(parsed.common.select.as_deref(), Some("*"));
        assert!(parsed.common.no_auto_iteration);
        assert!(parsed.common.force);
        assert!(!parsed.common.passthru);
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = parse_args(op("invoke"), &args(&["--FunctionName", "fn", "--Bogus", "x"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn scalar_supplied_twice_is_rejected() {
        let err = parse_args(op("invoke"), &args(&["--FunctionName", "a", "--FunctionArn", "b"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn missing_value_is_rejected() {
        assert!(parse_args(op("invoke"), &args(&["--FunctionName"])).is_err());
    }

    #[test]
    fn negative_integers_are_values() {
        let parsed = parse_args(
            op("create-event-source-mapping"),
            &args(&["--FunctionName", "fn", "--MaximumRetryAttempts", "-1"]),
        )
        .unwrap();
        assert_eq!(parsed.raw["MaximumRetryAttempts"], vec!["-1"]);
    }

    #[test]
    fn lists_accumulate_and_split_on_commas() {
        let def = op("create-function").find_param("SecurityGroupId").unwrap();
        let value = convert(def, &args(&["sg-1,sg-2", "sg-3"])).unwrap();
        assert_eq!(
            value,
            Tristate::Set(ParamValue::StringList(vec!["sg-1".into(), "sg-2".into(), "sg-3".into()]))
        );
    }

    #[test]
    fn filter_patterns_keep_their_commas() {
        let def = op("create-event-source-mapping").find_param("Filter").unwrap();
        let pattern = r#"{"body":{"a":["x"]},"b":["y"]}"#;
        let value = convert(def, &args(&[pattern, r#"{"c":[1,2]}"#])).unwrap();
        assert_eq!(
            value,
            Tristate::Set(ParamValue::StringList(vec![pattern.to_string(), r#"{"c":[1,2]}"#.to_string()]))
        );
    }

    #[test]
    fn map_values_may_contain_commas() {
        let def = op("create-function").find_param("Environment_Variable").unwrap();
        let value = convert(def, &args(&["HOSTS=a,b,STAGE=prod", "EMPTY="])).unwrap();
        let expected = BTreeMap::from([
            ("EMPTY".to_string(), String::new()),
            ("HOSTS".to_string(), "a,b".to_string()),
            ("STAGE".to_string(), "prod".to_string()),
        ]);
        assert_eq!(value, Tristate::Set(ParamValue::StringMap(expected)));
    }

    #[test]
    fn map_entry_without_key_is_rejected() {
        let def = op("create-function").find_param("Environment_Variable").unwrap();
        assert!(convert(def, &args(&["just-a-value"])).is_err());
    }

    #[test]
    fn empty_value_on_clearable_collection_is_explicitly_empty() {
        let def = op("update-function-configuration").find_param("Layers").unwrap();
        assert_eq!(convert(def, &args(&[""])).unwrap(), Tristate::Empty);
    }

    #[test]
    fn empty_value_on_plain_collection_is_an_error() {
        let def = op("create-function").find_param("Layers").unwrap();
        assert!(convert(def, &args(&[""])).is_err());
    }

    #[test]
    fn maps_parse_key_value_pairs() {
        let def = op("create-function").find_param("Environment_Variable").unwrap();
        let value = convert(def, &args(&["STAGE=prod,DEBUG=0"])).unwrap();
        let expected = BTreeMap::from([("DEBUG".to_string(), "0".to_string()), ("STAGE".to_string(), "prod".to_string())]);
        assert_eq!(value, Tristate::Set(ParamValue::StringMap(expected)));
    }

    #[test]
    fn routing_weights_must_be_numbers() {
        let def = op("create-alias").find_param("AdditionalVersionWeight").unwrap();
        assert!(convert(def, &args(&["2=abc"])).is_err());
        let value = convert(def, &args(&["2=0.25"])).unwrap();
        assert_eq!(value, Tristate::Set(ParamValue::DoubleMap(BTreeMap::from([("2".to_string(), 0.25)]))));
    }

    #[test]
    fn integers_and_timestamps_are_validated() {
        let create = op("create-event-source-mapping");
        assert!(convert(create.find_param("BatchSize").unwrap(), &args(&["ten"])).is_err());
        assert!(convert(create.find_param("StartingPositionTimestamp").unwrap(), &args(&["yesterday"])).is_err());
        assert_eq!(
            convert(create.find_param("StartingPositionTimestamp").unwrap(), &args(&["2024-01-15T12:00:00Z"])).unwrap(),
            Tristate::Set(ParamValue::Timestamp("2024-01-15T12:00:00Z".to_string()))
        );
    }

    #[test]
    fn text_blob_accepts_inline_or_file() {
        let def = op("invoke").find_param("Payload").unwrap();
        assert_eq!(
            convert(def, &args(&["{\"a\":1}"])).unwrap(),
            Tristate::Set(ParamValue::Blob(BlobSource::Inline("{\"a\":1}".to_string())))
        );
        assert_eq!(
            convert(def, &args(&["file:///tmp/event.json"])).unwrap(),
            Tristate::Set(ParamValue::Blob(BlobSource::File(PathBuf::from("/tmp/event.json"))))
        );
    }
}
