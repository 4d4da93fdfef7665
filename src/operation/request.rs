//! Request construction from an invocation context
//!
//! The request is a JSON tree shaped like the operation's input, plus the
//! binary buffers addressed by the same dotted paths. Nested groups
//! (VpcConfig, Environment, ...) only come into existence when one of their
//! members is assigned, so a group the caller never touched is absent from
//! the request rather than sent as an empty object.

use crate::error::ShimError;
use crate::operation::context::InvocationContext;
use crate::operation::params::{BlobSource, ParamValue, Tristate};
use crate::operation::payload::PayloadBuffer;
use crate::operation::registry::ParamKind;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ServiceRequest {
    fields: Map<String, Value>,
    blobs: BTreeMap<String, PayloadBuffer>,
}

impl ServiceRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by dotted path
    pub fn field(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn blob(&self, path: &str) -> Option<&PayloadBuffer> {
        self.blobs.get(path)
    }

    pub fn blobs(&self) -> impl Iterator<Item = (&str, &PayloadBuffer)> {
        self.blobs.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when at least one member of a nested group was assigned
    pub fn has_group(&self, group: &str) -> bool {
        let prefix = format!("{}.", group);
        self.field(group).is_some() || self.blobs.keys().any(|k| k.starts_with(&prefix))
    }

    /// Assign a field, creating intermediate groups on the way
    pub fn set_field(&mut self, path: &str, value: Value) {
        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(leaf) = parts.pop() else {
            return;
        };

        let mut current = &mut self.fields;
        for part in parts {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(leaf.to_string(), value);
    }

    pub fn remove_field(&mut self, path: &str) -> Option<Value> {
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };
        match parent {
            None => self.fields.remove(leaf),
            Some(parent) => {
                let mut current = &mut self.fields;
                for part in parent.split('.') {
                    current = current.get_mut(part)?.as_object_mut()?;
                }
                current.remove(leaf)
            }
        }
    }

    pub fn set_blob(&mut self, path: &str, buffer: PayloadBuffer) {
        self.blobs.insert(path.to_string(), buffer);
    }
}

/// Build the outbound request. Blob parameters are read into buffers here.
pub fn build_request(ctx: &InvocationContext<'_>) -> Result<ServiceRequest, ShimError> {
    let mut request = ServiceRequest::new();

    for slot in &ctx.slots {
        let def = slot.def;
        match &slot.value {
            Tristate::Unset => {}
            Tristate::Empty => {
                let empty = match def.kind {
                    ParamKind::StringList => Value::Array(Vec::new()),
                    _ => Value::Object(Map::new()),
                };
                debug!("Clearing {} ({})", def.name, def.target);
                request.set_field(&def.target, empty);
            }
            Tristate::Set(ParamValue::Blob(source)) => {
                let buffer = PayloadBuffer::new(def.name.clone(), read_blob(&def.name, source)?);
                debug!("Loaded {} bytes for {}", buffer.len(), def.name);
                request.set_blob(&def.target, buffer);
            }
            Tristate::Set(value) => request.set_field(&def.target, value.to_json()),
        }
    }

    debug!(
        "Built {} request: {} ({} blob(s))",
        ctx.operation.api,
        serde_json::Value::Object(request.fields().clone()),
        request.blobs().count()
    );
    Ok(request)
}

fn read_blob(param: &str, source: &BlobSource) -> Result<Vec<u8>, ShimError> {
    match source {
        BlobSource::Inline(text) => Ok(text.as_bytes().to_vec()),
        BlobSource::File(path) => std::fs::read(path).map_err(|e| ShimError::InvalidValue {
            param: param.to_string(),
            reason: format!("cannot read {}: {}", path.display(), e),
        }),
    }
}
