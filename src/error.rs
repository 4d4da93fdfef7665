//! Error taxonomy for lamctl
//!
//! Configuration errors are raised locally before any remote call.
//! Remote errors are carried unchanged, except name-resolution failures
//! which are rewrapped with the endpoint that could not be reached.

use thiserror::Error;

/// Error returned by a [`crate::aws::client::LambdaApi`] implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with an error of its own error model.
    #[error("{code}: {message}")]
    Service {
        code: String,
        message: String,
        status: Option<u16>,
        request_id: Option<String>,
    },

    /// The request could not be constructed from the supplied values.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request never produced a service response.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Fragments of resolver errors as rendered by hyper, the system resolver
/// and the SDK connector.
const NAME_RESOLUTION_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname provided",
    "no such host",
    "temporary failure in name resolution",
];

impl ClientError {
    #[cfg(test)]
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Service {
            code: code.into(),
            message: message.into(),
            status: None,
            request_id: None,
        }
    }

    /// True when the transport failure was caused by DNS resolution.
    pub fn is_name_resolution(&self) -> bool {
        let ClientError::Transport { source, .. } = self else {
            return false;
        };

        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(source.as_ref());
        while let Some(err) = current {
            let text = err.to_string().to_lowercase();
            if NAME_RESOLUTION_MARKERS.iter().any(|m| text.contains(m)) {
                return true;
            }
            current = err.source();
        }
        false
    }
}

/// Error surfaced by a command invocation.
#[derive(Debug, Error)]
pub enum ShimError {
    #[error("missing required parameter '{param}' for operation '{operation}'")]
    MissingParameter { operation: String, param: String },

    #[error("invalid value for parameter '{param}': {reason}")]
    InvalidValue { param: String, reason: String },

    #[error("--Select and --PassThru cannot be used together")]
    SelectionConflict,

    #[error("invalid --Select value '{expr}': {reason}")]
    InvalidSelection { expr: String, reason: String },

    #[error("operation '{0}' modifies resources and is blocked in read-only mode")]
    ReadOnly(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(
        "Name resolution failure attempting to reach service endpoint {endpoint}. \
         Check the --region or --endpoint-url value (or the configured default)."
    )]
    EndpointUnreachable {
        endpoint: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Remote(ClientError),
}

impl ShimError {
    /// True for errors detected before any remote call was attempted.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            ShimError::Cancelled | ShimError::EndpointUnreachable { .. } | ShimError::Remote(_)
        )
    }
}

impl From<ClientError> for ShimError {
    fn from(err: ClientError) -> Self {
        if err.is_name_resolution() {
            let endpoint = match &err {
                ClientError::Transport { endpoint, .. } => endpoint.clone(),
                ClientError::Service { .. } | ClientError::InvalidRequest(_) => String::new(),
            };
            return ShimError::EndpointUnreachable {
                endpoint,
                source: err,
            };
        }
        ShimError::Remote(err)
    }
}
