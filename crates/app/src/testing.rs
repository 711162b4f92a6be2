//! In-memory port implementations shared by the unit tests of this crate.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use herald_domain::error::HeraldError;
use herald_domain::id::RuleId;
use herald_domain::log::{AutomationLog, Page, PageRequest};
use herald_domain::notification::Notification;
use herald_domain::rule::{ActionConfig, ActionKind, AutomationRule};
use herald_domain::template::Template;
use herald_domain::time::Timestamp;

use crate::ports::{DeliveryError, LogStore, NotificationSender, RuleRepository, TemplateRepository};

fn unreachable_store() -> HeraldError {
    HeraldError::Storage(Box::new(std::io::Error::other("store unreachable")))
}

// ── Rules ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRuleRepo {
    rules: Mutex<Vec<AutomationRule>>,
    failing: AtomicBool,
}

impl InMemoryRuleRepo {
    pub fn with(rules: Vec<AutomationRule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            failing: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn modify(&self, id: RuleId, f: impl FnOnce(&mut AutomationRule)) -> Result<(), HeraldError> {
        let mut rules = self.rules.lock().unwrap();
        let rule = rules.iter_mut().find(|r| r.id == id).ok_or_else(|| {
            HeraldError::from(herald_domain::error::NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            })
        })?;
        f(rule);
        Ok(())
    }
}

impl RuleRepository for InMemoryRuleRepo {
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HeraldError>> + Send {
        self.rules.lock().unwrap().push(rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, HeraldError>> + Send {
        let r = self.rules.lock().unwrap().iter().find(|r| r.id == id).cloned();
        async { Ok(r) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<AutomationRule>, HeraldError>> + Send {
        let r = self.rules.lock().unwrap().clone();
        async { Ok(r) }
    }

    fn get_active(
        &self,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, HeraldError>> + Send {
        let r = if self.failing.load(Ordering::SeqCst) {
            Err(unreachable_store())
        } else {
            Ok(self
                .rules
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.is_active)
                .cloned()
                .collect())
        };
        async { r }
    }

    fn update(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HeraldError>> + Send {
        let r = self
            .modify(rule.id, |stored| *stored = rule.clone())
            .map(|()| rule);
        async { r }
    }

    fn replace_actions(
        &self,
        id: RuleId,
        actions: Vec<ActionConfig>,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<(), HeraldError>> + Send {
        let r = self.modify(id, |stored| {
            stored.actions = actions;
            stored.updated_at = updated_at;
        });
        async { r }
    }

    fn set_active(
        &self,
        id: RuleId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<(), HeraldError>> + Send {
        let r = self.modify(id, |stored| {
            stored.is_active = is_active;
            stored.updated_at = updated_at;
        });
        async { r }
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HeraldError>> + Send {
        self.rules.lock().unwrap().retain(|r| r.id != id);
        async { Ok(()) }
    }
}

// ── Templates ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryTemplateRepo {
    templates: Mutex<Vec<Template>>,
}

impl InMemoryTemplateRepo {
    pub fn with(templates: Vec<Template>) -> Self {
        Self {
            templates: Mutex::new(templates),
        }
    }
}

impl TemplateRepository for InMemoryTemplateRepo {
    fn find(
        &self,
        channel: ActionKind,
        slug: &str,
        event_type: &str,
    ) -> impl Future<Output = Result<Option<Template>, HeraldError>> + Send {
        let r = self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.channel == channel && t.slug == slug && t.event_type == event_type)
            .cloned();
        async { Ok(r) }
    }

    fn upsert(
        &self,
        template: Template,
    ) -> impl Future<Output = Result<Template, HeraldError>> + Send {
        let mut templates = self.templates.lock().unwrap();
        templates.retain(|t| {
            !(t.channel == template.channel
                && t.slug == template.slug
                && t.event_type == template.event_type)
        });
        templates.push(template.clone());
        async { Ok(template) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Template>, HeraldError>> + Send {
        let r = self.templates.lock().unwrap().clone();
        async { Ok(r) }
    }
}

// ── Logs ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryLogStore {
    logs: Mutex<Vec<AutomationLog>>,
    failing: AtomicBool,
}

impl InMemoryLogStore {
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn logs(&self) -> Vec<AutomationLog> {
        self.logs.lock().unwrap().clone()
    }
}

impl LogStore for InMemoryLogStore {
    fn append(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<AutomationLog, HeraldError>> + Send {
        let r = if self.failing.load(Ordering::SeqCst) {
            Err(unreachable_store())
        } else {
            self.logs.lock().unwrap().push(log.clone());
            Ok(log)
        };
        async { r }
    }

    fn list(
        &self,
        page: PageRequest,
        rule_id: Option<RuleId>,
    ) -> impl Future<Output = Result<Page<AutomationLog>, HeraldError>> + Send {
        let matching: Vec<AutomationLog> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|l| rule_id.is_none_or(|id| l.rule_id == id))
            .cloned()
            .collect();
        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(page.per_page as usize)
            .collect();
        async move { Ok(Page::new(items, page, total)) }
    }
}

// ── Sender ─────────────────────────────────────────────────────

/// Records every notification; fails, stalls or panics for chosen recipients.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Notification>>,
    failing: Mutex<Vec<String>>,
    stalling: Mutex<Vec<String>>,
    panicking: Mutex<Vec<String>>,
}

impl RecordingSender {
    pub fn fail_for(&self, recipient: &str) {
        self.failing.lock().unwrap().push(recipient.to_string());
    }

    pub fn stall_for(&self, recipient: &str) {
        self.stalling.lock().unwrap().push(recipient.to_string());
    }

    pub fn panic_for(&self, recipient: &str) {
        self.panicking.lock().unwrap().push(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSender for RecordingSender {
    fn deliver(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send {
        let recipient = notification.recipient().to_string();
        let fails = self.failing.lock().unwrap().contains(&recipient);
        let stalls = self.stalling.lock().unwrap().contains(&recipient);
        let panics = self.panicking.lock().unwrap().contains(&recipient);
        self.sent.lock().unwrap().push(notification);
        async move {
            if panics {
                panic!("smtp client crashed for {recipient}");
            }
            if stalls {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if fails {
                Err(DeliveryError::new(format!("{recipient} bounced")))
            } else {
                Ok(())
            }
        }
    }
}
