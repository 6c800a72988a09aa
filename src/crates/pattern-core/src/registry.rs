//! Pattern registry for storing and dispatching pattern handlers
//!
//! Provides a thread-safe catalog mapping pattern ids to live handlers plus a
//! uniform execution entry point. The catalog lock guards map bookkeeping
//! only: it is released before any `validate` or `execute` call, so a slow
//! handler never blocks registration, lookup or execution of other patterns.

use crate::error::{PatternError, Result};
use crate::pattern::{Pattern, PatternDescriptor, PatternInput, PatternKind, PatternResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Shared handle to a registered handler
pub type PatternHandle = Arc<dyn Pattern>;

/// Thread-safe registry of pattern handlers
///
/// Cloning is cheap and every clone shares the same catalog, so one instance
/// built at start-up can be handed to every consumer.
#[derive(Clone, Default)]
pub struct PatternRegistry {
    patterns: Arc<RwLock<HashMap<String, PatternHandle>>>,
}

impl std::fmt::Debug for PatternRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl PatternRegistry {
    /// Create a new empty pattern registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern handler under its descriptor id
    ///
    /// # Arguments
    /// * `handler` - Handler to register; its `descriptor().id` is the key
    ///
    /// # Returns
    /// * `Ok(())` if registration succeeded
    /// * `Err(PatternError::DuplicateId)` if the id is already taken; the
    ///   existing handler is left in place
    pub fn register(&self, handler: PatternHandle) -> Result<()> {
        let id = handler.id().to_string();
        let mut patterns = self.patterns.write();

        if patterns.contains_key(&id) {
            return Err(PatternError::DuplicateId(id));
        }

        debug!(pattern_id = %id, kind = %handler.kind(), "Registered pattern");
        patterns.insert(id, handler);
        Ok(())
    }

    /// Register a concrete pattern value
    pub fn register_pattern<P: Pattern + 'static>(&self, pattern: P) -> Result<()> {
        self.register(Arc::new(pattern))
    }

    /// Register or replace a pattern handler
    ///
    /// Unlike `register()`, this overwrites an existing handler with the same id.
    ///
    /// # Arguments
    /// * `handler` - Handler to register
    ///
    /// # Returns
    /// * `Some(PatternHandle)` - the handler that was replaced
    /// * `None` if the id was free
    pub fn register_or_replace(&self, handler: PatternHandle) -> Option<PatternHandle> {
        let id = handler.id().to_string();
        let previous = self.patterns.write().insert(id.clone(), handler);
        debug!(pattern_id = %id, replaced = previous.is_some(), "Registered pattern");
        previous
    }

    /// Remove a pattern from the registry
    ///
    /// Removing an id that is not registered is a no-op.
    ///
    /// # Arguments
    /// * `id` - Pattern identifier to remove
    ///
    /// # Returns
    /// * `Some(PatternHandle)` if the pattern was registered
    /// * `None` otherwise
    pub fn unregister(&self, id: &str) -> Option<PatternHandle> {
        let removed = self.patterns.write().remove(id);
        if removed.is_some() {
            debug!(pattern_id = %id, "Unregistered pattern");
        }
        removed
    }

    /// Get a handler by id
    ///
    /// # Arguments
    /// * `id` - Pattern identifier to look up
    ///
    /// # Returns
    /// * `Some(PatternHandle)` if the pattern exists
    /// * `None` if pattern not found
    pub fn lookup(&self, id: &str) -> Option<PatternHandle> {
        self.patterns.read().get(id).cloned()
    }

    /// Check if a pattern is registered
    pub fn contains(&self, id: &str) -> bool {
        self.patterns.read().contains_key(id)
    }

    /// Get number of registered patterns
    pub fn count(&self) -> usize {
        self.patterns.read().len()
    }

    /// Get all registered pattern ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.patterns.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of every registered descriptor, sorted by id
    pub fn list(&self) -> Vec<PatternDescriptor> {
        let mut descriptors: Vec<PatternDescriptor> = self
            .patterns
            .read()
            .values()
            .map(|handler| handler.descriptor().clone())
            .collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    /// Snapshot of descriptors of the given kind, sorted by id
    ///
    /// # Arguments
    /// * `kind` - Kind to filter on
    pub fn list_by_kind(&self, kind: PatternKind) -> Vec<PatternDescriptor> {
        self.list()
            .into_iter()
            .filter(|descriptor| descriptor.kind == kind)
            .collect()
    }

    /// Clear all registered patterns
    pub fn clear(&self) {
        self.patterns.write().clear();
    }

    /// Execute a single pattern
    ///
    /// Resolves the handler, validates the input, then returns the
    /// handler's result unmodified.
    ///
    /// # Arguments
    /// * `id` - Pattern identifier
    /// * `input` - Input handed to `validate` and then `execute`
    ///
    /// # Returns
    /// * `Err(PatternError::NotFound)` if no handler is registered under `id`
    /// * `Err(PatternError::InvalidInput)` if validation rejects the input;
    ///   `execute` is not called
    /// * Otherwise whatever the handler's `execute` returns
    pub async fn execute(&self, id: &str, input: PatternInput) -> Result<PatternResult> {
        let handler = self
            .lookup(id)
            .ok_or_else(|| PatternError::NotFound(id.to_string()))?;

        if !handler.validate(&input) {
            debug!(pattern_id = %id, "Input rejected by validation");
            return Err(PatternError::invalid_input(
                id,
                "input rejected by pattern validation",
            ));
        }

        debug!(pattern_id = %id, kind = %handler.kind(), "Executing pattern");
        handler.execute(input).await
    }

    /// Execute several patterns concurrently
    ///
    /// Each request runs as its own task. Results are returned in request
    /// order. The first failure is returned as the batch error and the
    /// remaining tasks are aborted.
    pub async fn execute_batch(
        &self,
        requests: Vec<(String, PatternInput)>,
    ) -> Result<Vec<PatternResult>> {
        let total = requests.len();
        let mut tasks = JoinSet::new();

        for (index, (id, input)) in requests.into_iter().enumerate() {
            let registry = self.clone();
            tasks.spawn(async move { (index, registry.execute(&id, input).await) });
        }

        let mut results: Vec<Option<PatternResult>> = (0..total).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined
                .map_err(|e| PatternError::Unknown(format!("Batch task failed: {}", e)))?;

            match outcome {
                Ok(result) => results[index] = Some(result),
                Err(e) => {
                    warn!(index, error = %e, "Batch request failed, aborting remaining tasks");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoPattern {
        descriptor: PatternDescriptor,
        executions: AtomicUsize,
    }

    impl EchoPattern {
        fn new(id: &str, kind: PatternKind) -> Self {
            Self {
                descriptor: PatternDescriptor::new(id, format!("Echo {}", id), kind),
                executions: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Pattern for EchoPattern {
        fn descriptor(&self) -> &PatternDescriptor {
            &self.descriptor
        }

        async fn execute(&self, input: PatternInput) -> Result<PatternResult> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(PatternResult::success(input.text, 0.001))
        }
    }

    fn echo(id: &str) -> PatternHandle {
        Arc::new(EchoPattern::new(id, PatternKind::Local))
    }

    #[test]
    fn test_new_registry() {
        let registry = PatternRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_register_pattern() {
        let registry = PatternRegistry::new();
        assert!(registry.register(echo("test1")).is_ok());
        assert_eq!(registry.count(), 1);
        assert!(registry.contains("test1"));
    }

    #[test]
    fn test_register_duplicate_fails() {
        let registry = PatternRegistry::new();
        let first = echo("test1");
        registry.register(first.clone()).unwrap();

        let result = registry.register(echo("test1"));
        assert_eq!(result, Err(PatternError::DuplicateId("test1".to_string())));

        assert_eq!(registry.count(), 1);
        let kept = registry.lookup("test1").unwrap();
        assert!(Arc::ptr_eq(&kept, &first));
    }

    #[test]
    fn test_register_or_replace() {
        let registry = PatternRegistry::new();
        assert!(registry.register_or_replace(echo("test1")).is_none());
        assert!(registry.register_or_replace(echo("test1")).is_some());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_unregister() {
        let registry = PatternRegistry::new();
        registry.register(echo("test1")).unwrap();

        assert!(registry.unregister("test1").is_some());
        assert_eq!(registry.count(), 0);

        assert!(registry.unregister("nonexistent").is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_list_and_list_by_kind() {
        let registry = PatternRegistry::new();
        registry.register(echo("b")).unwrap();
        registry.register(echo("a")).unwrap();
        registry
            .register(Arc::new(EchoPattern::new("remote", PatternKind::RemoteWorker)))
            .unwrap();

        let ids: Vec<String> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b", "remote"]);

        assert_eq!(registry.list_by_kind(PatternKind::Local).len(), 2);
        assert_eq!(registry.list_by_kind(PatternKind::RemoteWorker).len(), 1);
        assert!(registry.list_by_kind(PatternKind::RemoteApi).is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = PatternRegistry::new();
        registry.register(echo("test1")).unwrap();
        registry.register(echo("test2")).unwrap();

        registry.clear();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_clones_share_catalog() {
        use std::thread;

        let registry = PatternRegistry::new();
        let registry_clone = registry.clone();

        let handle = thread::spawn(move || {
            registry_clone.register(echo("thread_test")).unwrap();
        });
        handle.join().unwrap();

        assert!(registry.contains("thread_test"));
    }

    #[tokio::test]
    async fn test_execute_not_found() {
        let registry = PatternRegistry::new();
        let err = registry
            .execute("missing-id", PatternInput::new("x"))
            .await
            .unwrap_err();
        assert_eq!(err, PatternError::NotFound("missing-id".to_string()));
        assert!(err.to_string().contains("missing-id"));
    }

    #[tokio::test]
    async fn test_execute_rejects_blank_input_without_executing() {
        let registry = PatternRegistry::new();
        let pattern = Arc::new(EchoPattern::new("echo", PatternKind::Local));
        registry.register(pattern.clone()).unwrap();

        let err = registry
            .execute("echo", PatternInput::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidInput { .. }));
        assert_eq!(pattern.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_execute_batch_preserves_order() {
        let registry = PatternRegistry::new();
        registry.register(echo("echo")).unwrap();

        let requests = (0..10)
            .map(|i| ("echo".to_string(), PatternInput::new(format!("item-{}", i))))
            .collect();

        let results = registry.execute_batch(requests).await.unwrap();
        assert_eq!(results.len(), 10);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.output, format!("item-{}", i));
        }
    }

    #[tokio::test]
    async fn test_execute_batch_fails_fast() {
        let registry = PatternRegistry::new();
        registry.register(echo("echo")).unwrap();

        let requests = vec![
            ("echo".to_string(), PatternInput::new("ok")),
            ("missing".to_string(), PatternInput::new("x")),
        ];

        let err = registry.execute_batch(requests).await.unwrap_err();
        assert_eq!(err, PatternError::NotFound("missing".to_string()));
    }

    #[tokio::test]
    async fn test_execute_batch_empty() {
        let registry = PatternRegistry::new();
        let results = registry.execute_batch(Vec::new()).await.unwrap();
        assert!(results.is_empty());
    }
}
