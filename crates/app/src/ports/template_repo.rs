//! Template repository port — lookup and maintenance of channel templates.

use std::future::Future;
use std::sync::Arc;

use herald_domain::error::HeraldError;
use herald_domain::rule::ActionKind;
use herald_domain::template::Template;

/// Repository for [`Template`]s, keyed by `(channel, slug, event type)`.
pub trait TemplateRepository {
    /// Find the template an action refers to.
    fn find(
        &self,
        channel: ActionKind,
        slug: &str,
        event_type: &str,
    ) -> impl Future<Output = Result<Option<Template>, HeraldError>> + Send;

    /// Insert a template, or overwrite the one with the same key.
    fn upsert(
        &self,
        template: Template,
    ) -> impl Future<Output = Result<Template, HeraldError>> + Send;

    /// Get all templates.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Template>, HeraldError>> + Send;
}

impl<T: TemplateRepository + Send + Sync> TemplateRepository for Arc<T> {
    fn find(
        &self,
        channel: ActionKind,
        slug: &str,
        event_type: &str,
    ) -> impl Future<Output = Result<Option<Template>, HeraldError>> + Send {
        (**self).find(channel, slug, event_type)
    }

    fn upsert(
        &self,
        template: Template,
    ) -> impl Future<Output = Result<Template, HeraldError>> + Send {
        (**self).upsert(template)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Template>, HeraldError>> + Send {
        (**self).get_all()
    }
}
