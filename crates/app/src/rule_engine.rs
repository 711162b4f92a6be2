//! Rule engine — reacts to events by evaluating and firing automation rules.
//!
//! For each incoming event the engine loads the active rules of its type
//! (through the [`RuleCache`]), evaluates each rule's conditions against the
//! payload and hands matching rules to the [`ActionDispatcher`]. Every firing
//! is recorded by the [`ExecutionLogger`].

use std::sync::Arc;

use herald_domain::error::HeraldError;
use herald_domain::event::DomainEvent;
use herald_domain::log::AutomationLog;

use crate::dispatcher::ActionDispatcher;
use crate::execution_logger::ExecutionLogger;
use crate::ports::{LogStore, NotificationSender, RuleRepository, TemplateRepository};
use crate::rule_cache::RuleCache;

/// Event-driven rule engine.
pub struct RuleEngine<R, T, S, L> {
    rules: Arc<RuleCache<R>>,
    dispatcher: ActionDispatcher<T, S>,
    logger: ExecutionLogger<L>,
}

impl<R, T, S, L> RuleEngine<R, T, S, L>
where
    R: RuleRepository,
    T: TemplateRepository,
    S: NotificationSender,
    L: LogStore,
{
    /// Create a new engine.
    pub fn new(
        rules: Arc<RuleCache<R>>,
        dispatcher: ActionDispatcher<T, S>,
        logger: ExecutionLogger<L>,
    ) -> Self {
        Self {
            rules,
            dispatcher,
            logger,
        }
    }

    /// Process a single event against the active rules of its type.
    ///
    /// Rules run one after another in creation order. A rule whose
    /// conditions cannot be evaluated is logged with an error status and
    /// does not stop the others.
    ///
    /// Returns one log per fired or failed rule.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the rules cannot be loaded.
    #[tracing::instrument(skip(self, event), fields(event_id = %event.id, event_type = %event.event_type))]
    pub async fn handle(&self, event: &DomainEvent) -> Result<Vec<AutomationLog>, HeraldError> {
        let rules = self.rules.active_for(&event.event_type).await?;
        let mut logs = Vec::new();

        for rule in rules.iter() {
            let log = match rule.matches(event) {
                Ok(false) => continue,
                Ok(true) => {
                    let results = self.dispatcher.dispatch(rule, event).await;
                    let log = AutomationLog::fired(rule, event, results);
                    tracing::info!(
                        rule_id = %rule.id,
                        rule_name = %rule.name,
                        status = %log.status,
                        actions = log.action_results.len(),
                        "rule fired"
                    );
                    log
                }
                Err(err) => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        rule_name = %rule.name,
                        error = %err,
                        "unable to evaluate rule conditions"
                    );
                    AutomationLog::failed(rule, event, err.to_string())
                }
            };
            self.logger.record(&log).await;
            logs.push(log);
        }

        Ok(logs)
    }
}
