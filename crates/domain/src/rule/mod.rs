//! Automation rule — event type → condition tree → ordered actions.
//!
//! Rules are owned by administrators. Each rule listens to one event type,
//! optionally guards on a [`ConditionExpr`] evaluated against the event
//! payload, and fires its [`ActionConfig`]s in ascending `order`.

mod action;
mod condition;

pub use action::{ActionConfig, ActionKind, in_execution_order};
pub use condition::{
    ConditionError, ConditionExpr, FieldRef, LogicalOp, MAX_CONDITION_DEPTH, Operand, Operator,
};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::EventCatalog;
use crate::error::{HeraldError, ValidationError};
use crate::event::DomainEvent;
use crate::id::RuleId;
use crate::time::{Timestamp, now};

/// An administrator-defined binding of an event type to notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub event_type: String,
    pub is_active: bool,
    /// `None` means the rule matches every event of its type.
    #[serde(default)]
    pub conditions: Option<ConditionExpr>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Check domain invariants that do not depend on the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - the condition tree is malformed ([`ValidationError::InvalidCondition`])
    /// - two actions share an order ([`ValidationError::DuplicateActionOrder`])
    /// - an action has no template ([`ValidationError::EmptyTemplateRef`])
    /// - a webhook action has no url ([`ValidationError::MissingRecipient`])
    pub fn validate(&self) -> Result<(), HeraldError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(conditions) = &self.conditions {
            conditions.validate().map_err(ValidationError::from)?;
        }
        validate_actions(&self.actions)?;
        Ok(())
    }

    /// Check invariants, including that the event type is registered.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate), plus
    /// [`ValidationError::UnknownEventType`].
    pub fn validate_with(&self, catalog: &EventCatalog) -> Result<(), HeraldError> {
        self.validate()?;
        if !catalog.contains(&self.event_type) {
            return Err(ValidationError::UnknownEventType(self.event_type.clone()).into());
        }
        Ok(())
    }

    /// Does this rule fire for `event`?
    ///
    /// # Errors
    ///
    /// Propagates [`ConditionError`] from a malformed condition tree.
    pub fn matches(&self, event: &DomainEvent) -> Result<bool, ConditionError> {
        if self.event_type != event.event_type {
            return Ok(false);
        }
        match &self.conditions {
            Some(conditions) => conditions.evaluate(&event.payload),
            None => Ok(true),
        }
    }

    /// Actions sorted by `order`.
    #[must_use]
    pub fn ordered_actions(&self) -> Vec<&ActionConfig> {
        in_execution_order(&self.actions)
    }
}

/// Validate an action list on its own, as done for a full action replace.
///
/// # Errors
///
/// Returns [`HeraldError::Validation`] for duplicate orders, empty template
/// references or webhook actions without a recipient.
pub fn validate_actions(actions: &[ActionConfig]) -> Result<(), HeraldError> {
    let mut seen = HashSet::with_capacity(actions.len());
    for action in actions {
        if !seen.insert(action.order) {
            return Err(ValidationError::DuplicateActionOrder(action.order).into());
        }
        if action.template_ref.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateRef {
                order: action.order,
            }
            .into());
        }
        let has_recipient = action
            .recipient_template()
            .is_some_and(|r| !r.trim().is_empty());
        if !has_recipient {
            return Err(ValidationError::MissingRecipient {
                order: action.order,
            }
            .into());
        }
    }
    Ok(())
}

/// Step-by-step builder for [`AutomationRule`].
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    description: Option<String>,
    event_type: Option<String>,
    is_active: Option<bool>,
    conditions: Option<ConditionExpr>,
    actions: Vec<ActionConfig>,
    created_at: Option<Timestamp>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn conditions(mut self, conditions: ConditionExpr) -> Self {
        self.conditions = Some(conditions);
        self
    }

    #[must_use]
    pub fn action(mut self, action: ActionConfig) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn created_at(mut self, ts: Timestamp) -> Self {
        self.created_at = Some(ts);
        self
    }

    /// Consume the builder, validate, and return an [`AutomationRule`].
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Validation`] if required fields are missing or invalid.
    pub fn build(self) -> Result<AutomationRule, HeraldError> {
        let created_at = self.created_at.unwrap_or_else(now);
        let rule = AutomationRule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            event_type: self.event_type.unwrap_or_default(),
            is_active: self.is_active.unwrap_or(true),
            conditions: self.conditions,
            actions: self.actions,
            created_at,
            updated_at: created_at,
        };
        rule.validate()?;
        Ok(rule)
    }
}
