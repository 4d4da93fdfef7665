//! In-memory buffers for binary parameters (payloads, zip archives)
//!
//! A buffer lives exactly as long as the request that carries it. Dropping
//! the request releases the bytes; [`ReleaseWatch`] makes that observable.

use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
pub struct PayloadBuffer {
    label: String,
    bytes: Arc<Vec<u8>>,
}

impl PayloadBuffer {
    pub fn new(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        let label = label.into();
        trace!("Acquired {} byte buffer for {}", bytes.len(), label);
        Self {
            label,
            bytes: Arc::new(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[cfg(test)]
    pub fn watch(&self) -> ReleaseWatch {
        ReleaseWatch(Arc::downgrade(&self.bytes))
    }
}

impl Drop for PayloadBuffer {
    fn drop(&mut self) {
        trace!("Released {} byte buffer for {}", self.bytes.len(), self.label);
    }
}

/// Reports whether a [`PayloadBuffer`] has been released
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ReleaseWatch(std::sync::Weak<Vec<u8>>);

#[cfg(test)]
impl ReleaseWatch {
    pub fn is_released(&self) -> bool {
        self.0.strong_count() == 0
    }
}
