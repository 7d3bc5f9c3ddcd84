use metrics_exporter_prometheus::PrometheusHandle;
use staff_eval::workflows::evaluation::{
    Evaluation, EvaluationFilter, EvaluationId, EvaluationRepository, EvaluationStatus,
    NotificationError, NotificationPublisher, RepositoryError, StageNotification,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationRepository {
    records: Arc<Mutex<HashMap<EvaluationId, Evaluation>>>,
}

impl EvaluationRepository for InMemoryEvaluationRepository {
    fn insert(&self, record: Evaluation) -> Result<Evaluation, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(
        &self,
        record: Evaluation,
        expected: EvaluationStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) if existing.status == expected => {
                *existing = record;
                Ok(())
            }
            Some(_) => Err(RepositoryError::Conflict),
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &EvaluationId) -> Result<Option<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &EvaluationFilter) -> Result<Vec<Evaluation>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }
}

/// Keeps every stage notification in memory; stands in for the mail relay.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<StageNotification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: StageNotification) -> Result<(), NotificationError> {
        info!(
            template = %notification.template,
            evaluation_id = %notification.evaluation_id,
            recipient = ?notification.recipient_role,
            "stage notification queued"
        );
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<StageNotification> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .clone()
    }
}
