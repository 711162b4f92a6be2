//! Rule service — use-cases for managing automation rules.
//!
//! Every write goes through the [`RuleCache`] repository and invalidates the
//! cache, so the engine picks up changes on the next event.

use std::sync::Arc;

use herald_domain::catalog::EventCatalog;
use herald_domain::error::{HeraldError, NotFoundError};
use herald_domain::id::RuleId;
use herald_domain::rule::{ActionConfig, AutomationRule, validate_actions};
use herald_domain::time::now;

use crate::ports::RuleRepository;
use crate::rule_cache::RuleCache;

/// Application service for rule CRUD operations.
pub struct RuleService<R> {
    rules: Arc<RuleCache<R>>,
    catalog: Arc<EventCatalog>,
}

impl<R: RuleRepository> RuleService<R> {
    /// Create a new service sharing `rules` with the engine.
    pub fn new(rules: Arc<RuleCache<R>>, catalog: Arc<EventCatalog>) -> Self {
        Self { rules, catalog }
    }

    fn repo(&self) -> &R {
        self.rules.repository()
    }

    /// Create a new rule after validating it against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name, event_type = %rule.event_type))]
    pub async fn create_rule(&self, rule: AutomationRule) -> Result<AutomationRule, HeraldError> {
        rule.validate_with(&self.catalog)?;
        let created = self.repo().create(rule).await?;
        self.rules.invalidate().await;
        tracing::info!(rule_id = %created.id, "rule created");
        Ok(created)
    }

    /// Look up a rule by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::NotFound`] when no rule with `id` exists,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_rule(&self, id: RuleId) -> Result<AutomationRule, HeraldError> {
        self.repo().get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self) -> Result<Vec<AutomationRule>, HeraldError> {
        self.repo().get_all().await
    }

    /// Replace a rule's definition. Creation time is kept from the stored rule.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::NotFound`] for an unknown rule,
    /// [`HeraldError::Validation`] if invariants fail, or a storage error.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn update_rule(&self, mut rule: AutomationRule) -> Result<AutomationRule, HeraldError> {
        rule.validate_with(&self.catalog)?;
        let existing = self.get_rule(rule.id).await?;
        rule.created_at = existing.created_at;
        rule.updated_at = now();
        let updated = self.repo().update(rule).await?;
        self.rules.invalidate().await;
        Ok(updated)
    }

    /// Atomically replace every action of a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::NotFound`] for an unknown rule,
    /// [`HeraldError::Validation`] for an invalid action list, or a storage error.
    #[tracing::instrument(skip(self, actions), fields(actions = actions.len()))]
    pub async fn replace_actions(
        &self,
        id: RuleId,
        actions: Vec<ActionConfig>,
    ) -> Result<AutomationRule, HeraldError> {
        validate_actions(&actions)?;
        let mut rule = self.get_rule(id).await?;
        let updated_at = now();
        self.repo()
            .replace_actions(id, actions.clone(), updated_at)
            .await?;
        self.rules.invalidate().await;
        rule.actions = actions;
        rule.updated_at = updated_at;
        Ok(rule)
    }

    /// Flip a rule between active and inactive.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::NotFound`] for an unknown rule, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_rule(&self, id: RuleId) -> Result<AutomationRule, HeraldError> {
        let mut rule = self.get_rule(id).await?;
        rule.is_active = !rule.is_active;
        rule.updated_at = now();
        self.repo()
            .set_active(id, rule.is_active, rule.updated_at)
            .await?;
        self.rules.invalidate().await;
        tracing::info!(is_active = rule.is_active, "rule toggled");
        Ok(rule)
    }

    /// Delete a rule together with its actions and logs.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::NotFound`] for an unknown rule, or a storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), HeraldError> {
        self.get_rule(id).await?;
        self.repo().delete(id).await?;
        self.rules.invalidate().await;
        Ok(())
    }
}
