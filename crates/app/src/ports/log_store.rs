//! Log store port — append-only audit of rule firings.

use std::future::Future;
use std::sync::Arc;

use herald_domain::error::HeraldError;
use herald_domain::id::RuleId;
use herald_domain::log::{AutomationLog, Page, PageRequest};

/// Append-only store of [`AutomationLog`]s.
pub trait LogStore {
    /// Persist a new log entry.
    fn append(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<AutomationLog, HeraldError>> + Send;

    /// List logs newest-first, optionally restricted to one rule.
    fn list(
        &self,
        page: PageRequest,
        rule_id: Option<RuleId>,
    ) -> impl Future<Output = Result<Page<AutomationLog>, HeraldError>> + Send;
}

impl<T: LogStore + Send + Sync> LogStore for Arc<T> {
    fn append(
        &self,
        log: AutomationLog,
    ) -> impl Future<Output = Result<AutomationLog, HeraldError>> + Send {
        (**self).append(log)
    }

    fn list(
        &self,
        page: PageRequest,
        rule_id: Option<RuleId>,
    ) -> impl Future<Output = Result<Page<AutomationLog>, HeraldError>> + Send {
        (**self).list(page, rule_id)
    }
}
