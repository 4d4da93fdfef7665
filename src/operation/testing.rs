//! Recording fake for [`LambdaApi`] used by runner tests

use crate::aws::client::LambdaApi;
use crate::error::ClientError;
use crate::operation::payload::ReleaseWatch;
use crate::operation::request::ServiceRequest;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

/// What the fake saw for one call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub api: String,
    pub fields: Map<String, Value>,
    pub blobs: BTreeMap<String, Vec<u8>>,
    pub watches: Vec<ReleaseWatch>,
}

/// Answers calls from a script, in order. An exhausted script answers `{}`.
#[derive(Default)]
pub struct FakeLambda {
    script: Mutex<VecDeque<Result<Value, ClientError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeLambda {
    pub fn new(script: impl IntoIterator<Item = Result<Value, ClientError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LambdaApi for FakeLambda {
    async fn call(&self, api: &str, request: &ServiceRequest) -> Result<Value, ClientError> {
        self.calls.lock().unwrap().push(RecordedCall {
            api: api.to_string(),
            fields: request.fields().clone(),
            blobs: request
                .blobs()
                .map(|(path, buffer)| (path.to_string(), buffer.as_bytes().to_vec()))
                .collect(),
            watches: request.blobs().map(|(_, buffer)| buffer.watch()).collect(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Object(Map::new())))
    }
}
