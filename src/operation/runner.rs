//! Command runner: one invocation from parsed arguments to emitted values
//!
//! Everything that can be rejected locally (missing parameters, selection
//! conflicts, read-only mode) is rejected before the client is touched.
//! Binary buffers belong to the request and are released when it drops,
//! whichever way the call ends.

use crate::aws::client::LambdaApi;
use crate::error::ShimError;
use crate::operation::context::InvocationContext;
use crate::operation::params::{ParamValue, ParsedArgs};
use crate::operation::registry::{Impact, OperationDef, PageCap, PaginationDef};
use crate::operation::request::{build_request, ServiceRequest};
use crate::operation::select::Selection;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Asks the user whether a mutating operation may proceed
pub trait Confirm: Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Host-provided settings for one invocation
pub struct ExecutionOptions<'a> {
    pub readonly: bool,
    /// Lowest impact that requires confirmation
    pub confirm_threshold: Impact,
    pub confirm: &'a dyn Confirm,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed { emitted: usize },
    /// The user declined the confirmation prompt; nothing was sent
    Declined,
}

/// Run one operation, handing every projected value to `emit`.
pub async fn execute(
    client: &dyn LambdaApi,
    op: &OperationDef,
    args: ParsedArgs,
    options: &ExecutionOptions<'_>,
    emit: &mut dyn FnMut(Value),
) -> Result<Outcome, ShimError> {
    let ctx = InvocationContext::new(op, args)?;

    if op.is_mutating() {
        if options.readonly {
            return Err(ShimError::ReadOnly(op.name.clone()));
        }
        if op.impact >= options.confirm_threshold && !ctx.common.force {
            let prompt = confirmation_prompt(&ctx);
            if !options.confirm.confirm(&prompt) {
                info!("{} declined at confirmation prompt", op.name);
                return Ok(Outcome::Declined);
            }
        }
    }

    let mut request = build_request(&ctx)?;
    info!("Invoking {} ({})", op.name, op.api);

    let emitted = match &op.pagination {
        Some(paging) => paginate(client, &ctx, paging, &mut request, &options.cancel, emit).await,
        None => single(client, &ctx, &request, &options.cancel, emit).await,
    };

    drop(request);
    emitted.map(|emitted| Outcome::Completed { emitted })
}

fn confirmation_prompt(ctx: &InvocationContext<'_>) -> String {
    let target = ctx
        .operation
        .passthru
        .as_deref()
        .and_then(|param| ctx.value(param))
        .map(|v| match v.to_json() {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| ctx.operation.name.clone());

    format!(
        "Performing the operation \"{}\" ({} impact) on target \"{}\". Continue?",
        ctx.operation.api,
        ctx.operation.impact.label(),
        target
    )
}

/// Race the client call against cancellation
async fn call(
    client: &dyn LambdaApi,
    api: &str,
    request: &ServiceRequest,
    cancel: &CancellationToken,
) -> Result<Value, ShimError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ShimError::Cancelled),
        result = client.call(api, request) => result.map_err(ShimError::from),
    }
}

async fn single(
    client: &dyn LambdaApi,
    ctx: &InvocationContext<'_>,
    request: &ServiceRequest,
    cancel: &CancellationToken,
    emit: &mut dyn FnMut(Value),
) -> Result<usize, ShimError> {
    let response = call(client, &ctx.operation.api, request, cancel).await?;
    let projected = ctx.selection.project(&response, ctx);
    if projected.is_null() {
        return Ok(0);
    }
    emit(projected);
    Ok(1)
}

async fn paginate(
    client: &dyn LambdaApi,
    ctx: &InvocationContext<'_>,
    paging: &PaginationDef,
    request: &mut ServiceRequest,
    cancel: &CancellationToken,
    emit: &mut dyn FnMut(Value),
) -> Result<usize, ShimError> {
    let op = ctx.operation;
    let manual = ctx.supplied(&paging.input_token);
    let single_page = manual || ctx.common.no_auto_iteration;

    // Client-side cap: the limit is counted here and never sent.
    let client_cap = match (paging.cap, paging.limit_param.as_deref()) {
        (PageCap::Client, Some(limit)) => {
            let cap = ctx
                .value(limit)
                .and_then(ParamValue::as_integer)
                .map(|n| usize::try_from(n).unwrap_or(0));
            if let Some(def) = op.find_param(limit) {
                request.remove_field(&def.target);
            }
            cap
        }
        _ => None,
    };

    let flatten = ctx.selection.field() == Some(paging.items.as_str());
    let mut emitted = 0usize;
    let mut seen = 0usize;
    let mut page = 0usize;

    loop {
        page += 1;
        debug!("Fetching page {} of {}", page, op.name);

        let mut response = match call(client, &op.api, request, cancel).await {
            Ok(response) => response,
            Err(err) if client_cap.is_some() && emitted > 0 && !matches!(err, ShimError::Cancelled) => {
                warn!(
                    "{}: page {} failed after {} items were emitted, stopping: {}",
                    op.name, page, emitted, err
                );
                break;
            }
            Err(err) => return Err(err),
        };

        // The cap applies to the page before any projection sees it.
        if let Some(cap) = client_cap {
            if let Some(items) = response.get_mut(&paging.items).and_then(Value::as_array_mut) {
                items.truncate(cap.saturating_sub(seen));
            }
        }

        let items = response
            .get(&paging.items)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        seen += items.len();

        if flatten {
            for item in items {
                emit(item.clone());
                emitted += 1;
            }
        } else if !matches!(ctx.selection, Selection::EchoInput(_)) {
            let projected = ctx.selection.project(&response, ctx);
            if !projected.is_null() {
                emit(projected);
                emitted += 1;
            }
        }

        let next = response
            .get(&paging.output_token)
            .and_then(Value::as_str)
            .filter(|marker| !marker.is_empty())
            .map(str::to_string);

        if single_page || client_cap.is_some_and(|cap| seen >= cap) {
            break;
        }
        let Some(next) = next else {
            break;
        };
        request.set_field(&paging.input_token, Value::String(next));
    }

    if let Selection::EchoInput(_) = ctx.selection {
        let echoed = ctx.selection.project(&Value::Null, ctx);
        if !echoed.is_null() {
            emit(echoed);
            emitted += 1;
        }
    }

    debug!("{} finished after {} page(s), {} value(s) emitted", op.name, page, emitted);
    Ok(emitted)
}
