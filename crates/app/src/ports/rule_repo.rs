//! Rule repository port — persistence for automation rules.

use std::future::Future;
use std::sync::Arc;

use herald_domain::error::HeraldError;
use herald_domain::id::RuleId;
use herald_domain::rule::{ActionConfig, AutomationRule};
use herald_domain::time::Timestamp;

/// Repository for persisting and querying [`AutomationRule`]s with their actions.
pub trait RuleRepository {
    /// Create a new rule and its actions.
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HeraldError>> + Send;

    /// Get a rule by its unique identifier.
    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, HeraldError>> + Send;

    /// Get all rules, oldest first.
    fn get_all(&self) -> impl Future<Output = Result<Vec<AutomationRule>, HeraldError>> + Send;

    /// Get all active rules ordered by creation time, ties broken by id.
    fn get_active(
        &self,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, HeraldError>> + Send;

    /// Overwrite a rule, actions included.
    fn update(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HeraldError>> + Send;

    /// Replace every action of a rule at once.
    ///
    /// Implementations must apply the delete and the inserts atomically.
    fn replace_actions(
        &self,
        id: RuleId,
        actions: Vec<ActionConfig>,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<(), HeraldError>> + Send;

    /// Flip the active flag of a rule.
    fn set_active(
        &self,
        id: RuleId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<(), HeraldError>> + Send;

    /// Delete a rule, cascading to its actions and logs.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HeraldError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for Arc<T> {
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HeraldError>> + Send {
        (**self).create(rule)
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<AutomationRule>, HeraldError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<AutomationRule>, HeraldError>> + Send {
        (**self).get_all()
    }

    fn get_active(
        &self,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, HeraldError>> + Send {
        (**self).get_active()
    }

    fn update(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, HeraldError>> + Send {
        (**self).update(rule)
    }

    fn replace_actions(
        &self,
        id: RuleId,
        actions: Vec<ActionConfig>,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<(), HeraldError>> + Send {
        (**self).replace_actions(id, actions, updated_at)
    }

    fn set_active(
        &self,
        id: RuleId,
        is_active: bool,
        updated_at: Timestamp,
    ) -> impl Future<Output = Result<(), HeraldError>> + Send {
        (**self).set_active(id, is_active, updated_at)
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), HeraldError>> + Send {
        (**self).delete(id)
    }
}
