//! SDK Dispatcher - Lambda API calls through aws-sdk-lambda
//!
//! Reads the request tree into the typed fluent builders and turns the SDK
//! output back into JSON keyed by the service's own field names.

use crate::error::ClientError;
use crate::operation::request::ServiceRequest;
use aws_sdk_lambda::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::operation::RequestId;
use aws_sdk_lambda::types::{
    AliasRoutingConfiguration, ApplicationLogLevel, Architecture, DeadLetterConfig, DestinationConfig,
    Environment, EphemeralStorage, EventSourcePosition, ExecutionStatus, Filter, FilterCriteria, FunctionCode,
    FunctionResponseType, FunctionUrlAuthType, FunctionVersion, InvocationType, LayerVersionContentInput,
    LogFormat, LogType, LoggingConfig, OnFailure, PackageType, Runtime, ScalingConfig, SystemLogLevel,
    TracingConfig, TracingMode, VpcConfig,
};
use aws_sdk_lambda::Client;
use aws_smithy_types::date_time::{DateTime, Format};
use aws_smithy_types::Blob;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::debug;

// =============================================================================
// Request Helpers
// =============================================================================

fn string(req: &ServiceRequest, path: &str) -> Option<String> {
    req.field(path).and_then(Value::as_str).map(str::to_string)
}

fn int(req: &ServiceRequest, path: &str) -> Option<i32> {
    req.field(path)
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
}

fn boolean(req: &ServiceRequest, path: &str) -> Option<bool> {
    req.field(path).and_then(Value::as_bool)
}

fn strings(req: &ServiceRequest, path: &str) -> Option<Vec<String>> {
    req.field(path).and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    })
}

fn string_map(req: &ServiceRequest, path: &str) -> Option<HashMap<String, String>> {
    req.field(path).and_then(Value::as_object).map(|map| {
        map.iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect()
    })
}

fn double_map(req: &ServiceRequest, path: &str) -> Option<HashMap<String, f64>> {
    req.field(path).and_then(Value::as_object).map(|map| {
        map.iter()
            .filter_map(|(k, v)| v.as_f64().map(|d| (k.clone(), d)))
            .collect()
    })
}

fn timestamp(req: &ServiceRequest, path: &str) -> Option<DateTime> {
    req.field(path)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::from_str(s, Format::DateTime).ok())
}

fn blob(req: &ServiceRequest, path: &str) -> Option<Blob> {
    req.blob(path).map(|buffer| Blob::new(buffer.as_bytes().to_vec()))
}

/// Single enum value
fn variant<T>(req: &ServiceRequest, path: &str) -> Option<T>
where
    T: for<'a> From<&'a str>,
{
    string(req, path).map(|s| T::from(s.as_str()))
}

/// List of enum values
fn variants<T>(req: &ServiceRequest, path: &str) -> Option<Vec<T>>
where
    T: for<'a> From<&'a str>,
{
    strings(req, path).map(|items| items.iter().map(|s| T::from(s.as_str())).collect())
}

// =============================================================================
// Nested Groups
// =============================================================================

fn function_code(req: &ServiceRequest) -> Option<FunctionCode> {
    req.has_group("Code").then(|| {
        FunctionCode::builder()
            .set_zip_file(blob(req, "Code.ZipFile"))
            .set_s3_bucket(string(req, "Code.S3Bucket"))
            .set_s3_key(string(req, "Code.S3Key"))
            .set_s3_object_version(string(req, "Code.S3ObjectVersion"))
            .set_image_uri(string(req, "Code.ImageUri"))
            .build()
    })
}

fn vpc_config(req: &ServiceRequest) -> Option<VpcConfig> {
    req.has_group("VpcConfig").then(|| {
        VpcConfig::builder()
            .set_subnet_ids(strings(req, "VpcConfig.SubnetIds"))
            .set_security_group_ids(strings(req, "VpcConfig.SecurityGroupIds"))
            .set_ipv6_allowed_for_dual_stack(boolean(req, "VpcConfig.Ipv6AllowedForDualStack"))
            .build()
    })
}

fn environment(req: &ServiceRequest) -> Option<Environment> {
    req.has_group("Environment").then(|| {
        Environment::builder()
            .set_variables(string_map(req, "Environment.Variables"))
            .build()
    })
}

fn tracing_config(req: &ServiceRequest) -> Option<TracingConfig> {
    req.has_group("TracingConfig").then(|| {
        TracingConfig::builder()
            .set_mode(variant::<TracingMode>(req, "TracingConfig.Mode"))
            .build()
    })
}

fn dead_letter_config(req: &ServiceRequest) -> Option<DeadLetterConfig> {
    req.has_group("DeadLetterConfig").then(|| {
        DeadLetterConfig::builder()
            .set_target_arn(string(req, "DeadLetterConfig.TargetArn"))
            .build()
    })
}

fn ephemeral_storage(req: &ServiceRequest) -> Result<Option<EphemeralStorage>, ClientError> {
    int(req, "EphemeralStorage.Size")
        .map(|size| EphemeralStorage::builder().size(size).build())
        .transpose()
        .map_err(|e| ClientError::InvalidRequest(e.to_string()))
}

fn logging_config(req: &ServiceRequest) -> Option<LoggingConfig> {
    req.has_group("LoggingConfig").then(|| {
        LoggingConfig::builder()
            .set_log_format(variant::<LogFormat>(req, "LoggingConfig.LogFormat"))
            .set_application_log_level(variant::<ApplicationLogLevel>(req, "LoggingConfig.ApplicationLogLevel"))
            .set_system_log_level(variant::<SystemLogLevel>(req, "LoggingConfig.SystemLogLevel"))
            .set_log_group(string(req, "LoggingConfig.LogGroup"))
            .build()
    })
}

fn routing_config(req: &ServiceRequest) -> Option<AliasRoutingConfiguration> {
    req.has_group("RoutingConfig").then(|| {
        AliasRoutingConfiguration::builder()
            .set_additional_version_weights(double_map(req, "RoutingConfig.AdditionalVersionWeights"))
            .build()
    })
}

fn destination_config(req: &ServiceRequest) -> Option<DestinationConfig> {
    req.has_group("DestinationConfig").then(|| {
        let on_failure = req.has_group("DestinationConfig.OnFailure").then(|| {
            OnFailure::builder()
                .set_destination(string(req, "DestinationConfig.OnFailure.Destination"))
                .build()
        });
        DestinationConfig::builder().set_on_failure(on_failure).build()
    })
}

fn filter_criteria(req: &ServiceRequest) -> Option<FilterCriteria> {
    req.has_group("FilterCriteria").then(|| {
        let filters = strings(req, "FilterCriteria.Filters").map(|patterns| {
            patterns
                .into_iter()
                .map(|pattern| Filter::builder().pattern(pattern).build())
                .collect()
        });
        FilterCriteria::builder().set_filters(filters).build()
    })
}

fn scaling_config(req: &ServiceRequest) -> Option<ScalingConfig> {
    req.has_group("ScalingConfig").then(|| {
        ScalingConfig::builder()
            .set_maximum_concurrency(int(req, "ScalingConfig.MaximumConcurrency"))
            .build()
    })
}

fn layer_content(req: &ServiceRequest) -> Option<LayerVersionContentInput> {
    req.has_group("Content").then(|| {
        LayerVersionContentInput::builder()
            .set_zip_file(blob(req, "Content.ZipFile"))
            .set_s3_bucket(string(req, "Content.S3Bucket"))
            .set_s3_key(string(req, "Content.S3Key"))
            .set_s3_object_version(string(req, "Content.S3ObjectVersion"))
            .build()
    })
}

// =============================================================================
// Response Shapes
// =============================================================================

fn object<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<Map<String, Value>>(),
    )
}

fn format_datetime(dt: &DateTime) -> Option<String> {
    dt.fmt(Format::DateTime).ok()
}

/// Output members rendered as wire text, whether the shape marks them
/// required (plain reference) or optional.
trait WireText {
    fn wire_text(self) -> Option<String>;
}

impl WireText for &DateTime {
    fn wire_text(self) -> Option<String> {
        format_datetime(self)
    }
}

impl WireText for Option<&DateTime> {
    fn wire_text(self) -> Option<String> {
        self.and_then(format_datetime)
    }
}

impl WireText for &ExecutionStatus {
    fn wire_text(self) -> Option<String> {
        Some(self.as_str().to_string())
    }
}

impl WireText for Option<&ExecutionStatus> {
    fn wire_text(self) -> Option<String> {
        self.map(|status| status.as_str().to_string())
    }
}

/// FunctionConfiguration, shared by every output that embeds one
macro_rules! function_configuration {
    ($c:expr) => {{
        let c = $c;
        object([
            ("FunctionName", json!(c.function_name())),
            ("FunctionArn", json!(c.function_arn())),
            ("Runtime", json!(c.runtime().map(|r| r.as_str()))),
            ("Role", json!(c.role())),
            ("Handler", json!(c.handler())),
            ("CodeSize", json!(c.code_size())),
            ("Description", json!(c.description())),
            ("Timeout", json!(c.timeout())),
            ("MemorySize", json!(c.memory_size())),
            ("LastModified", json!(c.last_modified())),
            ("CodeSha256", json!(c.code_sha256())),
            ("Version", json!(c.version())),
            ("State", json!(c.state().map(|s| s.as_str()))),
            ("StateReason", json!(c.state_reason())),
            ("LastUpdateStatus", json!(c.last_update_status().map(|s| s.as_str()))),
            ("PackageType", json!(c.package_type().map(|p| p.as_str()))),
            ("RevisionId", json!(c.revision_id())),
            (
                "Architectures",
                json!(c.architectures().iter().map(|a| a.as_str()).collect::<Vec<_>>()),
            ),
            (
                "Environment",
                json!(c.environment().map(|e| json!({ "Variables": e.variables() }))),
            ),
            (
                "VpcConfig",
                json!(c.vpc_config().map(|v| json!({
                    "SubnetIds": v.subnet_ids(),
                    "SecurityGroupIds": v.security_group_ids(),
                    "VpcId": v.vpc_id(),
                    "Ipv6AllowedForDualStack": v.ipv6_allowed_for_dual_stack(),
                }))),
            ),
            (
                "TracingConfig",
                json!(c.tracing_config().map(|t| json!({ "Mode": t.mode().map(|m| m.as_str()) }))),
            ),
            (
                "Layers",
                json!(c
                    .layers()
                    .iter()
                    .map(|l| json!({ "Arn": l.arn(), "CodeSize": l.code_size() }))
                    .collect::<Vec<_>>()),
            ),
            ("KMSKeyArn", json!(c.kms_key_arn())),
            (
                "DeadLetterConfig",
                json!(c.dead_letter_config().map(|d| json!({ "TargetArn": d.target_arn() }))),
            ),
            (
                "EphemeralStorage",
                json!(c.ephemeral_storage().map(|e| json!({ "Size": e.size() }))),
            ),
            (
                "LoggingConfig",
                json!(c.logging_config().map(|l| json!({
                    "LogFormat": l.log_format().map(|f| f.as_str()),
                    "ApplicationLogLevel": l.application_log_level().map(|v| v.as_str()),
                    "SystemLogLevel": l.system_log_level().map(|v| v.as_str()),
                    "LogGroup": l.log_group(),
                }))),
            ),
        ])
    }};
}

macro_rules! alias_configuration {
    ($a:expr) => {{
        let a = $a;
        object([
            ("AliasArn", json!(a.alias_arn())),
            ("Name", json!(a.name())),
            ("FunctionVersion", json!(a.function_version())),
            ("Description", json!(a.description())),
            (
                "RoutingConfig",
                json!(a
                    .routing_config()
                    .map(|r| json!({ "AdditionalVersionWeights": r.additional_version_weights() }))),
            ),
            ("RevisionId", json!(a.revision_id())),
        ])
    }};
}

macro_rules! event_source_mapping {
    ($m:expr) => {{
        let m = $m;
        object([
            ("UUID", json!(m.uuid())),
            ("EventSourceArn", json!(m.event_source_arn())),
            ("FunctionArn", json!(m.function_arn())),
            ("State", json!(m.state())),
            ("StateTransitionReason", json!(m.state_transition_reason())),
            ("BatchSize", json!(m.batch_size())),
            ("MaximumBatchingWindowInSeconds", json!(m.maximum_batching_window_in_seconds())),
            ("StartingPosition", json!(m.starting_position().map(|p| p.as_str()))),
            ("LastModified", json!(m.last_modified().and_then(format_datetime))),
            ("LastProcessingResult", json!(m.last_processing_result())),
            ("MaximumRetryAttempts", json!(m.maximum_retry_attempts())),
            ("MaximumRecordAgeInSeconds", json!(m.maximum_record_age_in_seconds())),
            ("BisectBatchOnFunctionError", json!(m.bisect_batch_on_function_error())),
            ("ParallelizationFactor", json!(m.parallelization_factor())),
            ("Topics", json!(m.topics())),
            ("Queues", json!(m.queues())),
            (
                "FilterCriteria",
                json!(m.filter_criteria().map(|f| json!({
                    "Filters": f.filters().iter().map(|x| json!({ "Pattern": x.pattern() })).collect::<Vec<_>>(),
                }))),
            ),
            (
                "FunctionResponseTypes",
                json!(m.function_response_types().iter().map(|t| t.as_str()).collect::<Vec<_>>()),
            ),
            (
                "DestinationConfig",
                json!(m.destination_config().map(|d| json!({
                    "OnFailure": d.on_failure().map(|o| json!({ "Destination": o.destination() })),
                }))),
            ),
            (
                "ScalingConfig",
                json!(m
                    .scaling_config()
                    .map(|s| json!({ "MaximumConcurrency": s.maximum_concurrency() }))),
            ),
        ])
    }};
}

macro_rules! durable_execution {
    ($e:expr) => {{
        let e = $e;
        object([
            ("DurableExecutionArn", json!(e.durable_execution_arn())),
            ("DurableExecutionName", json!(e.durable_execution_name())),
            ("FunctionArn", json!(e.function_arn())),
            ("Status", json!(e.status().wire_text())),
            ("StartTimestamp", json!(e.start_timestamp().wire_text())),
            ("EndTimestamp", json!(e.end_timestamp().wire_text())),
        ])
    }};
}

macro_rules! layer_version {
    ($v:expr) => {{
        let v = $v;
        object([
            ("LayerVersionArn", json!(v.layer_version_arn())),
            ("Version", json!(v.version())),
            ("Description", json!(v.description())),
            ("CreatedDate", json!(v.created_date())),
            (
                "CompatibleRuntimes",
                json!(v.compatible_runtimes().iter().map(|r| r.as_str()).collect::<Vec<_>>()),
            ),
            ("LicenseInfo", json!(v.license_info())),
            (
                "CompatibleArchitectures",
                json!(v.compatible_architectures().iter().map(|a| a.as_str()).collect::<Vec<_>>()),
            ),
        ])
    }};
}

// =============================================================================
// Error Mapping
// =============================================================================

fn sdk_error<E>(endpoint: &str, err: SdkError<E>) -> ClientError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    if matches!(err, SdkError::ServiceError(_)) {
        return ClientError::Service {
            code: err.code().unwrap_or("Unknown").to_string(),
            message: err.message().unwrap_or_default().to_string(),
            status: err.raw_response().map(|r| r.status().as_u16()),
            request_id: err.request_id().map(str::to_string),
        };
    }
    ClientError::Transport {
        endpoint: endpoint.to_string(),
        source: Box::new(err),
    }
}

macro_rules! send {
    ($builder:expr, $endpoint:expr) => {
        $builder.send().await.map_err(|e| sdk_error($endpoint, e))?
    };
}

// =============================================================================
// Dispatch
// =============================================================================

/// Execute one Lambda API call by its remote operation name
pub async fn invoke_sdk(
    client: &Client,
    endpoint: &str,
    api: &str,
    req: &ServiceRequest,
) -> Result<Value, ClientError> {
    debug!("Dispatching {} to {}", api, endpoint);

    match api {
        // ---------------------------------------------------------------------
        // Functions
        // ---------------------------------------------------------------------
        "Invoke" => {
            let output = send!(
                client
                    .invoke()
                    .set_function_name(string(req, "FunctionName"))
                    .set_invocation_type(variant::<InvocationType>(req, "InvocationType"))
                    .set_log_type(variant::<LogType>(req, "LogType"))
                    .set_client_context(string(req, "ClientContext"))
                    .set_qualifier(string(req, "Qualifier"))
                    .set_payload(blob(req, "Payload")),
                endpoint
            );
            Ok(object([
                ("StatusCode", json!(output.status_code())),
                ("FunctionError", json!(output.function_error())),
                ("LogResult", json!(output.log_result())),
                ("ExecutedVersion", json!(output.executed_version())),
                (
                    "Payload",
                    json!(output
                        .payload()
                        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned())),
                ),
            ]))
        }

        "CreateFunction" => {
            let output = send!(
                client
                    .create_function()
                    .set_function_name(string(req, "FunctionName"))
                    .set_role(string(req, "Role"))
                    .set_runtime(variant::<Runtime>(req, "Runtime"))
                    .set_handler(string(req, "Handler"))
                    .set_description(string(req, "Description"))
                    .set_timeout(int(req, "Timeout"))
                    .set_memory_size(int(req, "MemorySize"))
                    .set_publish(boolean(req, "Publish"))
                    .set_package_type(variant::<PackageType>(req, "PackageType"))
                    .set_kms_key_arn(string(req, "KMSKeyArn"))
                    .set_code(function_code(req))
                    .set_vpc_config(vpc_config(req))
                    .set_environment(environment(req))
                    .set_tracing_config(tracing_config(req))
                    .set_dead_letter_config(dead_letter_config(req))
                    .set_ephemeral_storage(ephemeral_storage(req)?)
                    .set_logging_config(logging_config(req))
                    .set_layers(strings(req, "Layers"))
                    .set_architectures(variants::<Architecture>(req, "Architectures"))
                    .set_tags(string_map(req, "Tags")),
                endpoint
            );
            Ok(function_configuration!(&output))
        }

        "GetFunction" => {
            let output = send!(
                client
                    .get_function()
                    .set_function_name(string(req, "FunctionName"))
                    .set_qualifier(string(req, "Qualifier")),
                endpoint
            );
            Ok(object([
                (
                    "Configuration",
                    json!(output.configuration().map(|c| function_configuration!(c))),
                ),
                (
                    "Code",
                    json!(output.code().map(|c| json!({
                        "RepositoryType": c.repository_type(),
                        "Location": c.location(),
                        "ImageUri": c.image_uri(),
                        "ResolvedImageUri": c.resolved_image_uri(),
                    }))),
                ),
                ("Tags", json!(output.tags())),
                (
                    "Concurrency",
                    json!(output
                        .concurrency()
                        .map(|c| json!({ "ReservedConcurrentExecutions": c.reserved_concurrent_executions() }))),
                ),
            ]))
        }

        "GetFunctionConfiguration" => {
            let output = send!(
                client
                    .get_function_configuration()
                    .set_function_name(string(req, "FunctionName"))
                    .set_qualifier(string(req, "Qualifier")),
                endpoint
            );
            Ok(function_configuration!(&output))
        }

        "UpdateFunctionCode" => {
            let output = send!(
                client
                    .update_function_code()
                    .set_function_name(string(req, "FunctionName"))
                    .set_zip_file(blob(req, "ZipFile"))
                    .set_s3_bucket(string(req, "S3Bucket"))
                    .set_s3_key(string(req, "S3Key"))
                    .set_s3_object_version(string(req, "S3ObjectVersion"))
                    .set_image_uri(string(req, "ImageUri"))
                    .set_publish(boolean(req, "Publish"))
                    .set_dry_run(boolean(req, "DryRun"))
                    .set_revision_id(string(req, "RevisionId"))
                    .set_architectures(variants::<Architecture>(req, "Architectures")),
                endpoint
            );
            Ok(function_configuration!(&output))
        }

        "UpdateFunctionConfiguration" => {
            let output = send!(
                client
                    .update_function_configuration()
                    .set_function_name(string(req, "FunctionName"))
                    .set_role(string(req, "Role"))
                    .set_handler(string(req, "Handler"))
                    .set_description(string(req, "Description"))
                    .set_timeout(int(req, "Timeout"))
                    .set_memory_size(int(req, "MemorySize"))
                    .set_runtime(variant::<Runtime>(req, "Runtime"))
                    .set_kms_key_arn(string(req, "KMSKeyArn"))
                    .set_revision_id(string(req, "RevisionId"))
                    .set_vpc_config(vpc_config(req))
                    .set_environment(environment(req))
                    .set_tracing_config(tracing_config(req))
                    .set_dead_letter_config(dead_letter_config(req))
                    .set_ephemeral_storage(ephemeral_storage(req)?)
                    .set_logging_config(logging_config(req))
                    .set_layers(strings(req, "Layers")),
                endpoint
            );
            Ok(function_configuration!(&output))
        }

        "DeleteFunction" => {
            send!(
                client
                    .delete_function()
                    .set_function_name(string(req, "FunctionName"))
                    .set_qualifier(string(req, "Qualifier")),
                endpoint
            );
            Ok(Value::Null)
        }

        "ListFunctions" => {
            let output = send!(
                client
                    .list_functions()
                    .set_master_region(string(req, "MasterRegion"))
                    .set_function_version(variant::<FunctionVersion>(req, "FunctionVersion"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            Ok(object([
                (
                    "Functions",
                    Value::Array(output.functions().iter().map(|c| function_configuration!(c)).collect()),
                ),
                ("NextMarker", json!(output.next_marker())),
            ]))
        }

        "PublishVersion" => {
            let output = send!(
                client
                    .publish_version()
                    .set_function_name(string(req, "FunctionName"))
                    .set_code_sha256(string(req, "CodeSha256"))
                    .set_description(string(req, "Description"))
                    .set_revision_id(string(req, "RevisionId")),
                endpoint
            );
            Ok(function_configuration!(&output))
        }

        "ListVersionsByFunction" => {
            let output = send!(
                client
                    .list_versions_by_function()
                    .set_function_name(string(req, "FunctionName"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            Ok(object([
                (
                    "Versions",
                    Value::Array(output.versions().iter().map(|c| function_configuration!(c)).collect()),
                ),
                ("NextMarker", json!(output.next_marker())),
            ]))
        }

        // ---------------------------------------------------------------------
        // Aliases
        // ---------------------------------------------------------------------
        "CreateAlias" => {
            let output = send!(
                client
                    .create_alias()
                    .set_function_name(string(req, "FunctionName"))
                    .set_name(string(req, "Name"))
                    .set_function_version(string(req, "FunctionVersion"))
                    .set_description(string(req, "Description"))
                    .set_routing_config(routing_config(req)),
                endpoint
            );
            Ok(alias_configuration!(&output))
        }

        "GetAlias" => {
            let output = send!(
                client
                    .get_alias()
                    .set_function_name(string(req, "FunctionName"))
                    .set_name(string(req, "Name")),
                endpoint
            );
            Ok(alias_configuration!(&output))
        }

        "UpdateAlias" => {
            let output = send!(
                client
                    .update_alias()
                    .set_function_name(string(req, "FunctionName"))
                    .set_name(string(req, "Name"))
                    .set_function_version(string(req, "FunctionVersion"))
                    .set_description(string(req, "Description"))
                    .set_routing_config(routing_config(req))
                    .set_revision_id(string(req, "RevisionId")),
                endpoint
            );
            Ok(alias_configuration!(&output))
        }

        "DeleteAlias" => {
            send!(
                client
                    .delete_alias()
                    .set_function_name(string(req, "FunctionName"))
                    .set_name(string(req, "Name")),
                endpoint
            );
            Ok(Value::Null)
        }

        "ListAliases" => {
            let output = send!(
                client
                    .list_aliases()
                    .set_function_name(string(req, "FunctionName"))
                    .set_function_version(string(req, "FunctionVersion"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            Ok(object([
                (
                    "Aliases",
                    Value::Array(output.aliases().iter().map(|a| alias_configuration!(a)).collect()),
                ),
                ("NextMarker", json!(output.next_marker())),
            ]))
        }

        // ---------------------------------------------------------------------
        // Event Source Mappings
        // ---------------------------------------------------------------------
        "CreateEventSourceMapping" => {
            let output = send!(
                client
                    .create_event_source_mapping()
                    .set_function_name(string(req, "FunctionName"))
                    .set_event_source_arn(string(req, "EventSourceArn"))
                    .set_enabled(boolean(req, "Enabled"))
                    .set_batch_size(int(req, "BatchSize"))
                    .set_maximum_batching_window_in_seconds(int(req, "MaximumBatchingWindowInSeconds"))
                    .set_starting_position(variant::<EventSourcePosition>(req, "StartingPosition"))
                    .set_starting_position_timestamp(timestamp(req, "StartingPositionTimestamp"))
                    .set_destination_config(destination_config(req))
                    .set_maximum_record_age_in_seconds(int(req, "MaximumRecordAgeInSeconds"))
                    .set_bisect_batch_on_function_error(boolean(req, "BisectBatchOnFunctionError"))
                    .set_maximum_retry_attempts(int(req, "MaximumRetryAttempts"))
                    .set_parallelization_factor(int(req, "ParallelizationFactor"))
                    .set_topics(strings(req, "Topics"))
                    .set_queues(strings(req, "Queues"))
                    .set_filter_criteria(filter_criteria(req))
                    .set_function_response_types(variants::<FunctionResponseType>(req, "FunctionResponseTypes"))
                    .set_scaling_config(scaling_config(req)),
                endpoint
            );
            Ok(event_source_mapping!(&output))
        }

        "GetEventSourceMapping" => {
            let output = send!(
                client.get_event_source_mapping().set_uuid(string(req, "UUID")),
                endpoint
            );
            Ok(event_source_mapping!(&output))
        }

        "UpdateEventSourceMapping" => {
            let output = send!(
                client
                    .update_event_source_mapping()
                    .set_uuid(string(req, "UUID"))
                    .set_function_name(string(req, "FunctionName"))
                    .set_enabled(boolean(req, "Enabled"))
                    .set_batch_size(int(req, "BatchSize"))
                    .set_maximum_batching_window_in_seconds(int(req, "MaximumBatchingWindowInSeconds"))
                    .set_destination_config(destination_config(req))
                    .set_maximum_record_age_in_seconds(int(req, "MaximumRecordAgeInSeconds"))
                    .set_bisect_batch_on_function_error(boolean(req, "BisectBatchOnFunctionError"))
                    .set_maximum_retry_attempts(int(req, "MaximumRetryAttempts"))
                    .set_parallelization_factor(int(req, "ParallelizationFactor"))
                    .set_filter_criteria(filter_criteria(req))
                    .set_function_response_types(variants::<FunctionResponseType>(req, "FunctionResponseTypes"))
                    .set_scaling_config(scaling_config(req)),
                endpoint
            );
            Ok(event_source_mapping!(&output))
        }

        "DeleteEventSourceMapping" => {
            let output = send!(
                client.delete_event_source_mapping().set_uuid(string(req, "UUID")),
                endpoint
            );
            Ok(event_source_mapping!(&output))
        }

        "ListEventSourceMappings" => {
            let output = send!(
                client
                    .list_event_source_mappings()
                    .set_event_source_arn(string(req, "EventSourceArn"))
                    .set_function_name(string(req, "FunctionName"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            Ok(object([
                (
                    "EventSourceMappings",
                    Value::Array(
                        output
                            .event_source_mappings()
                            .iter()
                            .map(|m| event_source_mapping!(m))
                            .collect(),
                    ),
                ),
                ("NextMarker", json!(output.next_marker())),
            ]))
        }

        // ---------------------------------------------------------------------
        // Permissions and Concurrency
        // ---------------------------------------------------------------------
        "AddPermission" => {
            let output = send!(
                client
                    .add_permission()
                    .set_function_name(string(req, "FunctionName"))
                    .set_statement_id(string(req, "StatementId"))
                    .set_action(string(req, "Action"))
                    .set_principal(string(req, "Principal"))
                    .set_source_arn(string(req, "SourceArn"))
                    .set_source_account(string(req, "SourceAccount"))
                    .set_event_source_token(string(req, "EventSourceToken"))
                    .set_qualifier(string(req, "Qualifier"))
                    .set_revision_id(string(req, "RevisionId"))
                    .set_principal_org_id(string(req, "PrincipalOrgID"))
                    .set_function_url_auth_type(variant::<FunctionUrlAuthType>(req, "FunctionUrlAuthType")),
                endpoint
            );
            Ok(json!({ "Statement": output.statement() }))
        }

        "RemovePermission" => {
            send!(
                client
                    .remove_permission()
                    .set_function_name(string(req, "FunctionName"))
                    .set_statement_id(string(req, "StatementId"))
                    .set_qualifier(string(req, "Qualifier"))
                    .set_revision_id(string(req, "RevisionId")),
                endpoint
            );
            Ok(Value::Null)
        }

        "GetPolicy" => {
            let output = send!(
                client
                    .get_policy()
                    .set_function_name(string(req, "FunctionName"))
                    .set_qualifier(string(req, "Qualifier")),
                endpoint
            );
            Ok(json!({
                "Policy": output.policy(),
                "RevisionId": output.revision_id(),
            }))
        }

        "PutFunctionConcurrency" => {
            let output = send!(
                client
                    .put_function_concurrency()
                    .set_function_name(string(req, "FunctionName"))
                    .set_reserved_concurrent_executions(int(req, "ReservedConcurrentExecutions")),
                endpoint
            );
            Ok(json!({ "ReservedConcurrentExecutions": output.reserved_concurrent_executions() }))
        }

        "DeleteFunctionConcurrency" => {
            send!(
                client
                    .delete_function_concurrency()
                    .set_function_name(string(req, "FunctionName")),
                endpoint
            );
            Ok(Value::Null)
        }

        // ---------------------------------------------------------------------
        // Layers
        // ---------------------------------------------------------------------
        "PublishLayerVersion" => {
            let output = send!(
                client
                    .publish_layer_version()
                    .set_layer_name(string(req, "LayerName"))
                    .set_description(string(req, "Description"))
                    .set_content(layer_content(req))
                    .set_compatible_runtimes(variants::<Runtime>(req, "CompatibleRuntimes"))
                    .set_license_info(string(req, "LicenseInfo"))
                    .set_compatible_architectures(variants::<Architecture>(req, "CompatibleArchitectures")),
                endpoint
            );
            Ok(object([
                ("LayerArn", json!(output.layer_arn())),
                ("LayerVersionArn", json!(output.layer_version_arn())),
                ("Description", json!(output.description())),
                ("CreatedDate", json!(output.created_date())),
                ("Version", json!(output.version())),
                (
                    "Content",
                    json!(output.content().map(|c| json!({
                        "Location": c.location(),
                        "CodeSha256": c.code_sha256(),
                        "CodeSize": c.code_size(),
                    }))),
                ),
                (
                    "CompatibleRuntimes",
                    json!(output.compatible_runtimes().iter().map(|r| r.as_str()).collect::<Vec<_>>()),
                ),
                ("LicenseInfo", json!(output.license_info())),
                (
                    "CompatibleArchitectures",
                    json!(output
                        .compatible_architectures()
                        .iter()
                        .map(|a| a.as_str())
                        .collect::<Vec<_>>()),
                ),
            ]))
        }

        "ListLayers" => {
            let output = send!(
                client
                    .list_layers()
                    .set_compatible_runtime(variant::<Runtime>(req, "CompatibleRuntime"))
                    .set_compatible_architecture(variant::<Architecture>(req, "CompatibleArchitecture"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            let layers: Vec<Value> = output
                .layers()
                .iter()
                .map(|l| {
                    json!({
                        "LayerName": l.layer_name(),
                        "LayerArn": l.layer_arn(),
                        "LatestMatchingVersion": l.latest_matching_version().map(|v| layer_version!(v)),
                    })
                })
                .collect();
            Ok(json!({ "Layers": layers, "NextMarker": output.next_marker() }))
        }

        "ListLayerVersions" => {
            let output = send!(
                client
                    .list_layer_versions()
                    .set_layer_name(string(req, "LayerName"))
                    .set_compatible_runtime(variant::<Runtime>(req, "CompatibleRuntime"))
                    .set_compatible_architecture(variant::<Architecture>(req, "CompatibleArchitecture"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            Ok(object([
                (
                    "LayerVersions",
                    Value::Array(output.layer_versions().iter().map(|v| layer_version!(v)).collect()),
                ),
                ("NextMarker", json!(output.next_marker())),
            ]))
        }

        // ---------------------------------------------------------------------
        // Durable Executions
        // ---------------------------------------------------------------------
        "ListDurableExecutionsByFunction" => {
            let output = send!(
                client
                    .list_durable_executions_by_function()
                    .set_function_name(string(req, "FunctionName"))
                    .set_qualifier(string(req, "Qualifier"))
                    .set_durable_execution_name(string(req, "DurableExecutionName"))
                    .set_statuses(variants::<ExecutionStatus>(req, "Statuses"))
                    .set_started_after(timestamp(req, "StartedAfter"))
                    .set_started_before(timestamp(req, "StartedBefore"))
                    .set_reverse_order(boolean(req, "ReverseOrder"))
                    .set_marker(string(req, "Marker"))
                    .set_max_items(int(req, "MaxItems")),
                endpoint
            );
            Ok(object([
                (
                    "DurableExecutions",
                    Value::Array(
                        output
                            .durable_executions()
                            .iter()
                            .map(|e| durable_execution!(e))
                            .collect(),
                    ),
                ),
                ("NextMarker", json!(output.next_marker())),
            ]))
        }

        // ---------------------------------------------------------------------
        // Tags and Account
        // ---------------------------------------------------------------------
        "TagResource" => {
            send!(
                client
                    .tag_resource()
                    .set_resource(string(req, "Resource"))
                    .set_tags(string_map(req, "Tags")),
                endpoint
            );
            Ok(Value::Null)
        }

        "UntagResource" => {
            send!(
                client
                    .untag_resource()
                    .set_resource(string(req, "Resource"))
                    .set_tag_keys(strings(req, "TagKeys")),
                endpoint
            );
            Ok(Value::Null)
        }

        "ListTags" => {
            let output = send!(client.list_tags().set_resource(string(req, "Resource")), endpoint);
            Ok(json!({ "Tags": output.tags() }))
        }

        "GetAccountSettings" => {
            let output = send!(client.get_account_settings(), endpoint);
            Ok(json!({
                "AccountLimit": output.account_limit().map(|l| json!({
                    "TotalCodeSize": l.total_code_size(),
                    "CodeSizeUnzipped": l.code_size_unzipped(),
                    "CodeSizeZipped": l.code_size_zipped(),
                    "ConcurrentExecutions": l.concurrent_executions(),
                    "UnreservedConcurrentExecutions": l.unreserved_concurrent_executions(),
                })),
                "AccountUsage": output.account_usage().map(|u| json!({
                    "TotalCodeSize": u.total_code_size(),
                    "FunctionCount": u.function_count(),
                })),
            }))
        }

        _ => Err(ClientError::InvalidRequest(format!(
            "operation {} is not supported by this client",
            api
        ))),
    }
}
