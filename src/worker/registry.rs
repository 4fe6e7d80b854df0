use std::collections::HashMap;
use std::sync::Arc;

use super::PUBLISH_JOB_POSTING_TASK;
use super::handler::{PublishJobPostingHandler, TaskHandler};
use crate::services::Services;

/// Registry mapping task type names to their handlers
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every handler this service provides.
    pub fn with_defaults(services: &Services) -> Self {
        let mut registry = Self::new();
        registry.register(
            PUBLISH_JOB_POSTING_TASK,
            Arc::new(PublishJobPostingHandler::new(services.postings.clone())),
        );
        registry
    }

    /// Register a handler, replacing any previous one for the same type
    pub fn register(
        &mut self,
        task_type: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
    ) -> &mut Self {
        self.handlers.insert(task_type.into(), handler);
        self
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(task_type).cloned()
    }

    /// Registered task types, sorted
    pub fn task_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{MemoryStore, Repositories};

    #[test]
    fn test_defaults_register_publish_handler() {
        let services = Services::new(Repositories::in_memory(MemoryStore::new()));
        let registry = HandlerRegistry::with_defaults(&services);

        assert_eq!(registry.task_types(), vec![PUBLISH_JOB_POSTING_TASK]);
        assert!(registry.get(PUBLISH_JOB_POSTING_TASK).is_some());
        assert!(registry.get("unknown").is_none());
    }
}
