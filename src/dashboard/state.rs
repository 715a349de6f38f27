//! Dashboard state: registered explanations and the shutdown trigger

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::explanation::{ExplanationRecord, ExplanationType};

struct RegisteredExplanation {
    id: String,
    record: Arc<ExplanationRecord>,
    registered_at: DateTime<Utc>,
}

/// Listing entry for a registered explanation
#[derive(Debug, Clone, Serialize)]
pub struct ExplanationSummary {
    pub id: String,
    pub name: Option<String>,
    pub explanation_type: ExplanationType,
    pub features: usize,
    pub registered_at: DateTime<Utc>,
}

/// Explanations hosted by a dashboard, in registration order
#[derive(Default)]
pub struct ExplanationRegistry {
    entries: RwLock<Vec<RegisteredExplanation>>,
}

impl ExplanationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// Register a record and return its id
    pub fn register(&self, record: Arc<ExplanationRecord>) -> String {
        let id = Self::generate_id();
        self.entries.write().push(RegisteredExplanation {
            id: id.clone(),
            record,
            registered_at: Utc::now(),
        });
        id
    }

    pub fn unregister(&self, id: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Arc<ExplanationRecord>> {
        self.entries
            .read()
            .iter()
            .find(|e| e.id == id)
            .map(|e| Arc::clone(&e.record))
    }

    pub fn list(&self) -> Vec<ExplanationSummary> {
        self.entries
            .read()
            .iter()
            .map(|e| ExplanationSummary {
                id: e.id.clone(),
                name: e.record.name().map(str::to_string),
                explanation_type: e.record.explanation_type(),
                features: e.record.feature_names().len(),
                registered_at: e.registered_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// One-shot shutdown signal shared by the runner and the `/api/shutdown` route
pub struct ShutdownTrigger {
    sender: Mutex<Option<oneshot::Sender<()>>>,
}

impl ShutdownTrigger {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Fire the signal; `false` if it was already fired
    pub fn fire(&self) -> bool {
        match self.sender.lock().take() {
            Some(tx) => {
                // Receiver gone means the server already exited
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }
}

/// State shared across dashboard handlers
pub struct DashboardState {
    pub registry: Arc<ExplanationRegistry>,
    pub shutdown: Arc<ShutdownTrigger>,
    pub started_at: DateTime<Utc>,
}

impl DashboardState {
    pub fn new(registry: Arc<ExplanationRegistry>, shutdown: Arc<ShutdownTrigger>) -> Self {
        Self {
            registry,
            shutdown,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::ExplanationPayload;

    fn record(name: &str) -> Arc<ExplanationRecord> {
        Arc::new(
            ExplanationRecord::new(ExplanationType::Global, ExplanationPayload::new(), vec![], vec![])
                .unwrap()
                .with_name(name),
        )
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let registry = ExplanationRegistry::new();
        let a = registry.register(record("first"));
        let b = registry.register(record("second"));

        let names: Vec<_> = registry.list().into_iter().map(|s| s.name.unwrap()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_ne!(a, b);
        assert_eq!(a.len(), 8);

        assert!(registry.unregister(&a));
        assert!(!registry.unregister(&a));
        assert!(registry.get(&a).is_none());
        assert!(registry.get(&b).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_shutdown_trigger_fires_once() {
        let (trigger, mut rx) = ShutdownTrigger::new();
        assert!(trigger.fire());
        assert!(!trigger.fire());
        assert!(rx.try_recv().is_ok());
    }
}
