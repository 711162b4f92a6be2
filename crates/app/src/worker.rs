//! Bounded worker pool draining the event bus.
//!
//! A single pool task receives events and spawns one task per event into a
//! [`JoinSet`]. A [`Semaphore`] caps how many events are processed at once;
//! when every permit is taken the pool stops receiving and events wait in
//! the bus queue. Finished tasks are reaped as they complete so a panic in
//! one event never takes the pool down.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use herald_domain::error::HeraldError;
use herald_domain::event::DomainEvent;
use herald_domain::log::AutomationLog;

use crate::event_bus::EventReceiver;
use crate::ports::{LogStore, NotificationSender, RuleRepository, TemplateRepository};
use crate::rule_engine::RuleEngine;

/// Anything that can process one event on the pool.
pub trait EventHandler: Send + Sync + 'static {
    fn process(
        &self,
        event: DomainEvent,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, HeraldError>> + Send;
}

impl<R, T, S, L> EventHandler for RuleEngine<R, T, S, L>
where
    R: RuleRepository + Send + Sync + 'static,
    T: TemplateRepository + Send + Sync + 'static,
    S: NotificationSender + Send + Sync + 'static,
    L: LogStore + Send + Sync + 'static,
{
    fn process(
        &self,
        event: DomainEvent,
    ) -> impl Future<Output = Result<Vec<AutomationLog>, HeraldError>> + Send {
        async move { self.handle(&event).await }
    }
}

/// Spawn the pool on the current runtime.
///
/// The returned handle completes once the bus is closed and every spawned
/// event task has finished.
pub fn spawn<H: EventHandler>(
    receiver: EventReceiver,
    handler: Arc<H>,
    max_concurrency: usize,
) -> JoinHandle<()> {
    tokio::spawn(run(receiver, handler, max_concurrency))
}

async fn run<H: EventHandler>(mut receiver: EventReceiver, handler: Arc<H>, max_concurrency: usize) {
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    tracing::info!(max_concurrency, "worker pool started");

    loop {
        tokio::select! {
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => reap(joined),
            permit = Arc::clone(&permits).acquire_owned() => {
                let Ok(permit) = permit else { break };
                let Some(event) = next_event(&mut receiver, &mut tasks).await else { break };
                let handler = Arc::clone(&handler);
                tasks.spawn(async move {
                    let _permit = permit;
                    process(handler.as_ref(), event).await;
                });
            }
        }
    }

    tracing::info!(pending = tasks.len(), "event bus closed, draining worker pool");
    while let Some(joined) = tasks.join_next().await {
        reap(joined);
    }
    tracing::info!("worker pool stopped");
}

/// Wait for the next event while reaping tasks that finish in the meantime.
async fn next_event(receiver: &mut EventReceiver, tasks: &mut JoinSet<()>) -> Option<DomainEvent> {
    loop {
        tokio::select! {
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => reap(joined),
            event = receiver.recv() => return event,
        }
    }
}

async fn process<H: EventHandler>(handler: &H, event: DomainEvent) {
    let event_id = event.id;
    let event_type = event.event_type.clone();
    match handler.process(event).await {
        Ok(logs) => {
            tracing::debug!(%event_id, %event_type, rules_fired = logs.len(), "event processed");
        }
        Err(err) => {
            tracing::error!(%event_id, %event_type, error = ?err, "unable to process event");
        }
    }
}

fn reap(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        if err.is_panic() {
            tracing::error!(error = %err, "event task panicked");
        } else {
            tracing::warn!(error = %err, "event task was cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ActionDispatcher;
    use crate::event_bus::EventBus;
    use crate::execution_logger::ExecutionLogger;
    use crate::ports::EventEmitter;
    use crate::rule_cache::RuleCache;
    use crate::testing::{InMemoryLogStore, InMemoryRuleRepo, InMemoryTemplateRepo, RecordingSender};
    use herald_domain::catalog::EventCatalog;
    use herald_domain::log::RuleStatus;
    use herald_domain::rule::{ActionConfig, ActionKind, AutomationRule};
    use herald_domain::template::{Renderer, Template};
    use herald_domain::time::now;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingHandler {
        seen: Mutex<Vec<String>>,
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EventHandler for CountingHandler {
        fn process(
            &self,
            event: DomainEvent,
        ) -> impl Future<Output = Result<Vec<AutomationLog>, HeraldError>> + Send {
            async move {
                let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(running, Ordering::SeqCst);
                if event.payload["panic"] == true {
                    panic!("handler exploded");
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                self.seen.lock().unwrap().push(event.event_type);
                self.running.fetch_sub(1, Ordering::SeqCst);
                Ok(Vec::new())
            }
        }
    }

    fn bus() -> (EventBus, EventReceiver) {
        EventBus::new(Arc::new(EventCatalog::builtin()), 64)
    }

    #[tokio::test]
    async fn should_process_every_queued_event_before_stopping() {
        let (bus, rx) = bus();
        let handler = Arc::new(CountingHandler::default());
        let pool = spawn(rx, Arc::clone(&handler), 4);

        for _ in 0..5 {
            bus.emit("user.signup", json!({}));
        }
        drop(bus);
        pool.await.unwrap();

        assert_eq!(handler.seen.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn should_not_exceed_max_concurrency() {
        let (bus, rx) = bus();
        let handler = Arc::new(CountingHandler::default());
        let pool = spawn(rx, Arc::clone(&handler), 2);

        for _ in 0..8 {
            bus.emit("purchase.completed", json!({}));
        }
        drop(bus);
        pool.await.unwrap();

        assert_eq!(handler.seen.lock().unwrap().len(), 8);
        assert!(handler.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn should_survive_a_panicking_event() {
        let (bus, rx) = bus();
        let handler = Arc::new(CountingHandler::default());
        let pool = spawn(rx, Arc::clone(&handler), 1);

        bus.emit("user.signup", json!({"panic": true}));
        bus.emit("user.password_reset", json!({}));
        drop(bus);
        pool.await.unwrap();

        assert_eq!(
            *handler.seen.lock().unwrap(),
            vec!["user.password_reset".to_string()]
        );
    }

    #[tokio::test]
    async fn should_run_no_rule_for_unregistered_event_types() {
        let rule = AutomationRule::builder()
            .name("Welcome")
            .event_type("user.signup")
            .action(
                ActionConfig::new(ActionKind::Email, "welcome", 0).with_recipient("ops@x.com"),
            )
            .build()
            .unwrap();
        let template = Template {
            slug: "welcome".to_string(),
            channel: ActionKind::Email,
            event_type: "user.signup".to_string(),
            subject: "Bem-vindo".to_string(),
            body: "Olá {{user.name}}".to_string(),
            icon: None,
            url: None,
            is_active: true,
            updated_at: now(),
        };
        let sender = Arc::new(RecordingSender::default());
        let logs = Arc::new(InMemoryLogStore::default());
        let engine = Arc::new(RuleEngine::new(
            Arc::new(RuleCache::new(InMemoryRuleRepo::with(vec![rule]))),
            ActionDispatcher::new(
                InMemoryTemplateRepo::with(vec![template]),
                Arc::clone(&sender),
                Renderer::default(),
            ),
            ExecutionLogger::new(Arc::clone(&logs)),
        ));
        let (bus, rx) = bus();
        let pool = spawn(rx, engine, 2);

        assert!(bus.emit("user.signup.v2", json!({})).is_none());
        assert!(bus.emit("", json!({})).is_none());
        assert!(bus.emit("user.signup", json!({"user": {"name": "Ana"}})).is_some());
        drop(bus);
        pool.await.unwrap();

        let written = logs.logs();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].event_type, "user.signup");
        assert_eq!(written[0].status, RuleStatus::Success);
        assert_eq!(sender.sent().len(), 1);
    }
}
