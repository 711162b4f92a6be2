//! Log service — read access to the automation audit trail.

use herald_domain::error::HeraldError;
use herald_domain::id::RuleId;
use herald_domain::log::{AutomationLog, Page, PageRequest};

use crate::ports::LogStore;

/// Application service for browsing automation logs.
pub struct LogService<L> {
    store: L,
}

impl<L: LogStore> LogService<L> {
    pub fn new(store: L) -> Self {
        Self { store }
    }

    /// Newest-first page of logs, optionally for a single rule.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the store.
    pub async fn list_logs(
        &self,
        page: PageRequest,
        rule_id: Option<RuleId>,
    ) -> Result<Page<AutomationLog>, HeraldError> {
        self.store.list(page, rule_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryLogStore;
    use herald_domain::event::DomainEvent;
    use herald_domain::rule::AutomationRule;
    use std::sync::Arc;

    fn rule(name: &str) -> AutomationRule {
        AutomationRule::builder()
            .name(name)
            .event_type("user.signup")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_page_logs_newest_first_and_filter_by_rule() {
        let store = Arc::new(InMemoryLogStore::default());
        let welcome = rule("Welcome");
        let nudge = rule("Nudge");
        for i in 0..3 {
            let event = DomainEvent::new("user.signup", serde_json::json!({"n": i}));
            store
                .append(AutomationLog::fired(&welcome, &event, Vec::new()))
                .await
                .unwrap();
            store
                .append(AutomationLog::fired(&nudge, &event, Vec::new()))
                .await
                .unwrap();
        }
        let svc = LogService::new(Arc::clone(&store));

        let page = svc.list_logs(PageRequest::new(1, 4), None).await.unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.items.len(), 4);
        assert_eq!(page.items[0].rule_name, "Nudge");

        let only_welcome = svc
            .list_logs(PageRequest::new(2, 2), Some(welcome.id))
            .await
            .unwrap();
        assert_eq!(only_welcome.total, 3);
        assert_eq!(only_welcome.items.len(), 1);
        assert!(only_welcome.items.iter().all(|l| l.rule_id == welcome.id));
    }
}
