//! Registry adapter for worker-backed patterns

use crate::client::IpcBridge;
use crate::messages::RpcRequest;
use async_trait::async_trait;
use pattern_core::{
    Pattern, PatternDescriptor, PatternError, PatternInput, PatternKind, PatternRegistry,
    PatternResult, Result,
};
use std::sync::Arc;
use tracing::warn;

/// A pattern whose work is done by the worker behind an [`IpcBridge`]
///
/// Bridge failures never escape `execute`; they are folded into a failed
/// `PatternResult` whose metadata carries the error code.
#[derive(Debug, Clone)]
pub struct RemotePattern {
    descriptor: PatternDescriptor,
    bridge: IpcBridge,
}

impl RemotePattern {
    /// Wrap `descriptor`, forcing its kind to `RemoteWorker`
    pub fn new(mut descriptor: PatternDescriptor, bridge: IpcBridge) -> Self {
        descriptor.kind = PatternKind::RemoteWorker;
        Self { descriptor, bridge }
    }
}

#[async_trait]
impl Pattern for RemotePattern {
    fn descriptor(&self) -> &PatternDescriptor {
        &self.descriptor
    }

    async fn execute(&self, input: PatternInput) -> Result<PatternResult> {
        let request = RpcRequest::from_input(self.id(), input);

        match self.bridge.execute(request).await {
            Ok(response) => Ok(response.into_pattern_result()),
            Err(e) => {
                let err = PatternError::from(e);
                warn!(pattern_id = %self.id(), error = %err, "Remote pattern failed");
                Ok(PatternResult::failure(err.to_string(), 0.0)
                    .with_metadata("error_code", err.error_code()))
            }
        }
    }
}

/// Register one `RemotePattern` per descriptor, all sharing `bridge`
///
/// Stops at the first duplicate id.
pub fn register_remote_patterns(
    registry: &PatternRegistry,
    bridge: &IpcBridge,
    descriptors: impl IntoIterator<Item = PatternDescriptor>,
) -> Result<usize> {
    let mut registered = 0;
    for descriptor in descriptors {
        registry.register(Arc::new(RemotePattern::new(descriptor, bridge.clone())))?;
        registered += 1;
    }
    Ok(registered)
}
