//! Event catalog — the registry of event types the platform can raise.
//!
//! The catalog is built once at startup (built-in schemas plus any extra
//! schemas declared in configuration) and is read-only afterwards. It is
//! shared behind an `Arc` rather than living in a mutable global.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ValidationError;

/// One variable an event makes available to conditions and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventVariable {
    /// Dot-path inside the payload, e.g. `"user.name"`.
    pub key: String,
    /// Human readable label shown to administrators.
    pub label: String,
}

/// Declaration of a single event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSchema {
    /// Unique key, e.g. `"lesson_plan.usage_limit"`.
    pub name: String,
    /// Grouping used by the admin UI (`"user"`, `"billing"`, …).
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub variables: Vec<EventVariable>,
    /// Sample payload used for template previews.
    #[serde(default)]
    pub example_payload: serde_json::Value,
}

impl EventSchema {
    /// Check that the schema can be registered.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Immutable lookup table of registered event schemas.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    schemas: BTreeMap<String, EventSchema>,
}

impl EventCatalog {
    /// Build a catalog from a list of schemas.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateEventType`] if two schemas share a
    /// name, or [`ValidationError::EmptyName`] for a blank name.
    pub fn from_schemas(
        schemas: impl IntoIterator<Item = EventSchema>,
    ) -> Result<Self, ValidationError> {
        let mut map = BTreeMap::new();
        for schema in schemas {
            schema.validate()?;
            if map.contains_key(&schema.name) {
                return Err(ValidationError::DuplicateEventType(schema.name));
            }
            map.insert(schema.name.clone(), schema);
        }
        Ok(Self { schemas: map })
    }

    /// The catalog of events raised by the platform itself.
    #[must_use]
    pub fn builtin() -> Self {
        let schemas = builtin_schemas()
            .into_iter()
            .map(|schema| (schema.name.clone(), schema))
            .collect();
        Self { schemas }
    }

    /// Built-in events extended with `extra` schemas.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateEventType`] when an extra schema
    /// reuses a name that is already registered.
    pub fn builtin_with(
        extra: impl IntoIterator<Item = EventSchema>,
    ) -> Result<Self, ValidationError> {
        Self::from_schemas(builtin_schemas().into_iter().chain(extra))
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EventSchema> {
        self.schemas.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Iterate over all schemas in name order.
    pub fn iter(&self) -> impl Iterator<Item = &EventSchema> {
        self.schemas.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn schema(
    name: &str,
    category: &str,
    description: &str,
    variables: &[(&str, &str)],
    example_payload: serde_json::Value,
) -> EventSchema {
    EventSchema {
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        variables: variables
            .iter()
            .map(|(key, label)| EventVariable {
                key: (*key).to_string(),
                label: (*label).to_string(),
            })
            .collect(),
        example_payload,
    }
}

const USER_VARIABLES: [(&str, &str); 3] = [
    ("user.name", "User name"),
    ("user.firstName", "User first name"),
    ("user.email", "User email"),
];

fn with_user<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    USER_VARIABLES
        .iter()
        .copied()
        .chain(extra.iter().copied())
        .collect()
}

#[allow(clippy::too_many_lines)]
fn builtin_schemas() -> Vec<EventSchema> {
    let user = json!({
        "id": "5f0c6a1e-3c55-4f43-9d57-0d7d0c1b2a11",
        "name": "Maria Silva",
        "firstName": "Maria",
        "email": "maria@example.com",
        "phone": "+5511999990000"
    });

    vec![
        schema(
            "user.signup",
            "user",
            "A new account was created.",
            &with_user(&[]),
            json!({ "user": user }),
        ),
        schema(
            "user.password_reset",
            "user",
            "A password reset was requested.",
            &with_user(&[("reset.url", "Reset link"), ("reset.expiresIn", "Link validity")]),
            json!({
                "user": user,
                "reset": { "url": "https://app.example.com/reset/abc", "expiresIn": "1 hour" }
            }),
        ),
        schema(
            "purchase.completed",
            "billing",
            "A one-off purchase was paid.",
            &with_user(&[
                ("purchase.product", "Product"),
                ("purchase.amount", "Amount"),
                ("purchase.currency", "Currency"),
            ]),
            json!({
                "user": user,
                "purchase": { "product": "Lesson pack", "amount": 49.9, "currency": "BRL" }
            }),
        ),
        schema(
            "subscription.activated",
            "billing",
            "A subscription became active.",
            &with_user(&[("plan.name", "Plan"), ("plan.price", "Price")]),
            json!({ "user": user, "plan": { "name": "Pro", "price": 29.9 } }),
        ),
        schema(
            "subscription.expiring",
            "billing",
            "A subscription expires soon.",
            &with_user(&[("plan.name", "Plan"), ("subscription.daysLeft", "Days left")]),
            json!({
                "user": user,
                "plan": { "name": "Pro" },
                "subscription": { "daysLeft": 3, "expiresAt": "2026-10-20" }
            }),
        ),
        schema(
            "subscription.expired",
            "billing",
            "A subscription ran out.",
            &with_user(&[("plan.name", "Plan"), ("subscription.expiresAt", "Expired at")]),
            json!({
                "user": user,
                "plan": { "name": "Pro" },
                "subscription": { "expiresAt": "2026-10-16" }
            }),
        ),
        schema(
            "subscription.cancelled",
            "billing",
            "A subscription was cancelled by the user.",
            &with_user(&[("plan.name", "Plan"), ("cancellation.reason", "Reason")]),
            json!({
                "user": user,
                "plan": { "name": "Pro" },
                "cancellation": { "reason": "too expensive" }
            }),
        ),
        schema(
            "lesson_plan.created",
            "lesson_plan",
            "A lesson plan was generated.",
            &with_user(&[("lessonPlan.title", "Lesson plan title"), ("lessonPlan.subject", "Subject")]),
            json!({
                "user": user,
                "lessonPlan": { "title": "Photosynthesis", "subject": "Biology" }
            }),
        ),
        schema(
            "lesson_plan.usage_limit",
            "lesson_plan",
            "The user reached the lesson plan quota of their plan.",
            &with_user(&[("usage.used", "Plans used"), ("usage.limit", "Plan quota")]),
            json!({ "user": user, "usage": { "used": 5, "limit": 5 } }),
        ),
        schema(
            "lesson_plan.exported",
            "lesson_plan",
            "A lesson plan was exported to a document.",
            &with_user(&[("lessonPlan.title", "Lesson plan title"), ("export.format", "Format")]),
            json!({
                "user": user,
                "lessonPlan": { "title": "Photosynthesis" },
                "export": { "format": "pdf" }
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str) -> EventSchema {
        EventSchema {
            name: name.to_string(),
            category: "custom".to_string(),
            description: String::new(),
            variables: vec![],
            example_payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn should_register_builtin_usage_limit_event() {
        let catalog = EventCatalog::builtin();
        let schema = catalog.get("lesson_plan.usage_limit").unwrap();
        assert_eq!(schema.category, "lesson_plan");
        assert!(schema.variables.iter().any(|v| v.key == "usage.limit"));
    }

    #[test]
    fn should_not_contain_unregistered_event() {
        let catalog = EventCatalog::builtin();
        assert!(!catalog.contains("user.deleted"));
    }

    #[test]
    fn should_have_example_payload_matching_declared_variables() {
        let catalog = EventCatalog::builtin();
        for schema in catalog.iter() {
            for variable in &schema.variables {
                assert!(
                    crate::payload::lookup(&schema.example_payload, &variable.key).is_some(),
                    "{} is missing {} in its example payload",
                    schema.name,
                    variable.key
                );
            }
        }
    }

    #[test]
    fn should_extend_builtin_catalog_with_extra_schema() {
        let catalog = EventCatalog::builtin_with([custom("classroom.invited")]).unwrap();
        assert!(catalog.contains("classroom.invited"));
        assert_eq!(catalog.len(), EventCatalog::builtin().len() + 1);
    }

    #[test]
    fn should_reject_extra_schema_that_shadows_builtin() {
        let result = EventCatalog::builtin_with([custom("user.signup")]);
        assert_eq!(
            result.unwrap_err(),
            ValidationError::DuplicateEventType("user.signup".to_string())
        );
    }

    #[test]
    fn should_reject_schema_with_blank_name() {
        let result = EventCatalog::from_schemas([custom("  ")]);
        assert_eq!(result.unwrap_err(), ValidationError::EmptyName);
    }

    #[test]
    fn should_iterate_in_name_order() {
        let catalog = EventCatalog::from_schemas([custom("b.event"), custom("a.event")]).unwrap();
        let names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a.event", "b.event"]);
    }
}
