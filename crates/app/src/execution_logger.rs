//! Execution logger — best-effort writer of the automation audit trail.

use herald_domain::log::AutomationLog;

use crate::ports::LogStore;

/// Appends one [`AutomationLog`] per rule firing. Never fails.
pub struct ExecutionLogger<L> {
    store: L,
}

impl<L: LogStore> ExecutionLogger<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    /// Persist `log`; a failing store is reported and otherwise ignored.
    pub async fn record(&self, log: &AutomationLog) {
        if let Err(err) = self.store.append(log.clone()).await {
            tracing::warn!(
                log_id = %log.id,
                rule_id = %log.rule_id,
                status = %log.status,
                error = ?err,
                "unable to write automation log"
            );
        }
    }
}
