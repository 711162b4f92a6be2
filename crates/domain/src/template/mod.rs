//! Channel templates and their rendering.
//!
//! Templates are managed by administrators outside of the engine; the engine
//! only looks them up by `(channel, slug, event type)` and renders them.

mod render;

pub use render::{RenderGlobals, RenderWarning, Rendered, Renderer, variables};

use serde::{Deserialize, Serialize};

use crate::error::{HeraldError, ValidationError};
use crate::rule::ActionKind;
use crate::time::Timestamp;

/// Message template for one channel and one event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Referenced by `ActionConfig::template_ref`.
    pub slug: String,
    pub channel: ActionKind,
    pub event_type: String,
    /// Email subject or push title. Unused by chat and webhook channels.
    #[serde(default)]
    pub subject: String,
    pub body: String,
    /// Push notification icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Push notification click-through url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub is_active: bool,
    pub updated_at: Timestamp,
}

impl Template {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HeraldError::Validation`] when the slug or body is blank.
    pub fn validate(&self) -> Result<(), HeraldError> {
        if self.slug.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateSlug.into());
        }
        if self.body.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateBody.into());
        }
        Ok(())
    }

    /// Every variable referenced by the subject, body, icon or url.
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut found = Vec::new();
        let sources = [
            Some(self.subject.as_str()),
            Some(self.body.as_str()),
            self.icon.as_deref(),
            self.url.as_deref(),
        ];
        for source in sources.into_iter().flatten() {
            for variable in variables(source) {
                if !found.contains(&variable) {
                    found.push(variable);
                }
            }
        }
        found
    }
}
