//! Template service — administrator access to channel templates.

use herald_domain::error::{HeraldError, NotFoundError};
use herald_domain::rule::ActionKind;
use herald_domain::template::Template;
use herald_domain::time::now;

use crate::ports::TemplateRepository;

/// Application service for template lookup and maintenance.
pub struct TemplateService<T> {
    repo: T,
}

impl<T: TemplateRepository> TemplateService<T> {
    pub fn new(repo: T) -> Self {
        Self { repo }
    }

    /// Insert or overwrite the template with the same `(channel, slug, event type)`.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Validation`] for a blank slug or body, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, template), fields(channel = %template.channel, slug = %template.slug))]
    pub async fn upsert_template(&self, mut template: Template) -> Result<Template, HeraldError> {
        template.validate()?;
        template.updated_at = now();
        self.repo.upsert(template).await
    }

    /// Find the template an action refers to.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::NotFound`] when no template matches, or a
    /// storage error from the repository.
    pub async fn get_template(
        &self,
        channel: ActionKind,
        slug: &str,
        event_type: &str,
    ) -> Result<Template, HeraldError> {
        self.repo
            .find(channel, slug, event_type)
            .await?
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Template",
                    id: format!("{channel}/{slug}/{event_type}"),
                }
                .into()
            })
    }

    /// List all templates.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_templates(&self) -> Result<Vec<Template>, HeraldError> {
        self.repo.get_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryTemplateRepo;
    use herald_domain::error::ValidationError;

    fn template(body: &str) -> Template {
        Template {
            slug: "welcome".to_string(),
            channel: ActionKind::Email,
            event_type: "user.signup".to_string(),
            subject: "Bem-vindo, {{user.name}}".to_string(),
            body: body.to_string(),
            icon: None,
            url: None,
            is_active: true,
            updated_at: now(),
        }
    }

    #[tokio::test]
    async fn should_overwrite_template_with_same_key() {
        let svc = TemplateService::new(InMemoryTemplateRepo::default());

        svc.upsert_template(template("v1")).await.unwrap();
        svc.upsert_template(template("v2")).await.unwrap();

        let all = svc.list_templates().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body, "v2");
    }

    #[tokio::test]
    async fn should_reject_blank_body() {
        let svc = TemplateService::new(InMemoryTemplateRepo::default());
        let result = svc.upsert_template(template("  ")).await;
        assert!(matches!(
            result,
            Err(HeraldError::Validation(ValidationError::EmptyTemplateBody))
        ));
    }

    #[tokio::test]
    async fn should_find_template_by_channel_slug_and_event_type() {
        let svc = TemplateService::new(InMemoryTemplateRepo::default());
        svc.upsert_template(template("Olá")).await.unwrap();

        let found = svc
            .get_template(ActionKind::Email, "welcome", "user.signup")
            .await
            .unwrap();
        assert_eq!(found.body, "Olá");

        let other_channel = svc
            .get_template(ActionKind::Push, "welcome", "user.signup")
            .await;
        assert!(matches!(other_channel, Err(HeraldError::NotFound(_))));
    }
}
