//! Action dispatcher — renders and sends a rule's actions one after another.
//!
//! Every action ends in an [`ActionResult`]; a failing or slow channel never
//! prevents the following actions from running.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use herald_domain::event::DomainEvent;
use herald_domain::log::{ActionResult, ActionStatus};
use herald_domain::notification::{
    ChatMessage, EmailMessage, Notification, PushMessage, WebhookMessage,
};
use herald_domain::rule::{ActionConfig, ActionKind, AutomationRule};
use herald_domain::template::{Rendered, Renderer, Template};

use crate::ports::{NotificationSender, TemplateRepository};

/// Default bound on a single `send` call.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Executes ordered actions against the channel senders.
pub struct ActionDispatcher<T, S> {
    templates: T,
    sender: S,
    renderer: Renderer,
    send_timeout: Duration,
}

impl<T, S> ActionDispatcher<T, S>
where
    T: TemplateRepository,
    S: NotificationSender,
{
    pub fn new(templates: T, sender: S, renderer: Renderer) -> Self {
        Self {
            templates,
            sender,
            renderer,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Run every action of `rule` for `event`, in ascending `order`.
    pub async fn dispatch(&self, rule: &AutomationRule, event: &DomainEvent) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(rule.actions.len());
        for action in rule.ordered_actions() {
            let started = Instant::now();
            let result = self.execute(action, event).await;
            let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
            let result = result.with_duration_ms(elapsed);
            match result.status {
                ActionStatus::Success => {
                    tracing::debug!(rule_id = %rule.id, action = %action, "action delivered");
                }
                ActionStatus::Skipped => {
                    tracing::info!(rule_id = %rule.id, action = %action, "action skipped");
                }
                ActionStatus::Error | ActionStatus::Timeout => {
                    tracing::warn!(
                        rule_id = %rule.id,
                        action = %action,
                        status = %result.status,
                        error = result.error.as_deref().unwrap_or_default(),
                        "action failed"
                    );
                }
            }
            results.push(result);
        }
        results
    }

    async fn execute(&self, action: &ActionConfig, event: &DomainEvent) -> ActionResult {
        let template = match self
            .templates
            .find(action.kind, &action.template_ref, &event.event_type)
            .await
        {
            Ok(Some(template)) => template,
            Ok(None) => {
                return ActionResult::new(action, ActionStatus::Error).with_error(format!(
                    "no {} template {:?} for event {}",
                    action.kind, action.template_ref, event.event_type
                ));
            }
            Err(err) => {
                return ActionResult::new(action, ActionStatus::Error)
                    .with_error(format!("template lookup failed: {err}"));
            }
        };
        if !template.is_active {
            return ActionResult::new(action, ActionStatus::Skipped)
                .with_error(format!("template {:?} is inactive", template.slug));
        }

        let (notification, warnings) = match self.compose(action, &template, event) {
            Ok(composed) => composed,
            Err(reason) => {
                return ActionResult::new(action, ActionStatus::Error).with_error(reason);
            }
        };
        if !warnings.is_empty() {
            tracing::warn!(action = %action, ?warnings, "template rendered with warnings");
        }

        let send = AssertUnwindSafe(async { self.sender.deliver(notification).await }).catch_unwind();
        let result = match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(Ok(()))) => ActionResult::new(action, ActionStatus::Success),
            Ok(Ok(Err(err))) => {
                ActionResult::new(action, ActionStatus::Error).with_error(err.reason)
            }
            Ok(Err(payload)) => ActionResult::new(action, ActionStatus::Error)
                .with_error(format!("sender panicked: {}", panic_message(payload.as_ref()))),
            Err(_elapsed) => ActionResult::new(action, ActionStatus::Timeout)
                .with_error(format!("no response within {:?}", self.send_timeout)),
        };
        result.with_warnings(warnings)
    }

    /// Render the template into the channel message for this action.
    fn compose(
        &self,
        action: &ActionConfig,
        template: &Template,
        event: &DomainEvent,
    ) -> Result<(Notification, Vec<String>), String> {
        let mut warnings = Vec::new();
        let mut render = |source: &str| {
            let Rendered { text, warnings: w } = self.renderer.render(source, event);
            for warning in w {
                let warning = warning.to_string();
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
            text
        };

        let recipient_template = action
            .recipient_template()
            .ok_or_else(|| format!("{action} has no recipient"))?;
        let recipient = render(recipient_template).trim().to_string();
        if recipient.is_empty() {
            return Err(format!("recipient {recipient_template:?} rendered empty"));
        }

        let notification = match action.kind {
            ActionKind::Email => Notification::Email(EmailMessage {
                to: recipient,
                subject: render(&template.subject),
                html: render(&template.body),
            }),
            ActionKind::Push => Notification::Push(PushMessage {
                subscription: recipient,
                title: render(&template.subject),
                body: render(&template.body),
                icon: template.icon.as_deref().map(&mut render),
                url: template.url.as_deref().map(&mut render),
                tag: template.slug.clone(),
            }),
            ActionKind::Whatsapp => Notification::Whatsapp(ChatMessage {
                to: recipient,
                body: render(&template.body),
            }),
            ActionKind::Webhook => Notification::Webhook(WebhookMessage {
                url: recipient,
                body: render(&template.body),
            }),
        };
        Ok((notification, warnings))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
