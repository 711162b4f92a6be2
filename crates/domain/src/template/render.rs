//! `{{path}}` interpolation.
//!
//! Rendering is plain lookup-and-replace: a token is a dot-path resolved
//! first against the computed globals (`event.*`, `app.*`) and then against
//! the event payload. There is no expression language. Unresolved tokens
//! render as the empty string and are reported as warnings.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;
use crate::payload::{display, lookup};

/// Application-level constants and formats available to every template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderGlobals {
    /// Exposed as `{{app.name}}`.
    pub app_name: String,
    /// Exposed as `{{app.url}}`.
    pub app_url: String,
    /// `strftime` format of `{{event.date}}`.
    pub date_format: String,
    /// `strftime` format of `{{event.time}}`.
    pub time_format: String,
}

impl Default for RenderGlobals {
    fn default() -> Self {
        Self {
            app_name: "Herald".to_string(),
            app_url: "http://localhost:3000".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            time_format: "%H:%M".to_string(),
        }
    }
}

/// A token that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderWarning {
    pub token: String,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unresolved variable {{{{{}}}}}", self.token)
    }
}

/// Output of a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<RenderWarning>,
}

/// Renders template strings for one set of globals.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    globals: RenderGlobals,
}

impl Renderer {
    #[must_use]
    pub fn new(globals: RenderGlobals) -> Self {
        Self { globals }
    }

    #[must_use]
    pub fn globals(&self) -> &RenderGlobals {
        &self.globals
    }

    /// Interpolate every `{{token}}` of `source` for `event`. Never fails.
    #[must_use]
    pub fn render(&self, source: &str, event: &DomainEvent) -> Rendered {
        let mut text = String::with_capacity(source.len());
        let mut warnings = Vec::new();

        for piece in Pieces::new(source) {
            match piece {
                Piece::Text(literal) => text.push_str(literal),
                Piece::Token(token) => match self.resolve(token, event) {
                    Some(value) => text.push_str(&value),
                    None => warnings.push(RenderWarning {
                        token: token.to_string(),
                    }),
                },
            }
        }

        Rendered { text, warnings }
    }

    fn resolve(&self, token: &str, event: &DomainEvent) -> Option<String> {
        if let Some(value) = self.global(token, event) {
            return Some(value);
        }
        lookup(&event.payload, token).map(display)
    }

    fn global(&self, token: &str, event: &DomainEvent) -> Option<String> {
        match token {
            "event.date" => format_timestamp(event, &self.globals.date_format),
            "event.time" => format_timestamp(event, &self.globals.time_format),
            "event.type" => Some(event.event_type.clone()),
            "event.id" => Some(event.id.to_string()),
            "app.name" => Some(self.globals.app_name.clone()),
            "app.url" => Some(self.globals.app_url.clone()),
            _ => None,
        }
    }
}

fn format_timestamp(event: &DomainEvent, format: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", event.occurred_at.format(format)).ok()?;
    Some(out)
}

/// Distinct tokens referenced by `source`, in order of first appearance.
#[must_use]
pub fn variables(source: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for piece in Pieces::new(source) {
        if let Piece::Token(token) = piece {
            if !found.iter().any(|t| t == token) {
                found.push(token.to_string());
            }
        }
    }
    found
}

enum Piece<'a> {
    Text(&'a str),
    Token(&'a str),
}

/// Splits a template into literal text and trimmed tokens.
///
/// An opening `{{` without a matching `}}` is kept as literal text.
struct Pieces<'a> {
    rest: &'a str,
    pending: Option<&'a str>,
}

impl<'a> Pieces<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            rest: source,
            pending: None,
        }
    }
}

impl<'a> Iterator for Pieces<'a> {
    type Item = Piece<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Piece::Token(token));
        }
        if self.rest.is_empty() {
            return None;
        }
        let token_bounds = self.rest.find("{{").and_then(|start| {
            let inner = start + 2;
            self.rest[inner..]
                .find("}}")
                .map(|len| (start, inner, inner + len))
        });
        match token_bounds {
            Some((start, inner, close)) => {
                let literal = &self.rest[..start];
                let token = self.rest[inner..close].trim();
                self.rest = &self.rest[close + 2..];
                if literal.is_empty() {
                    Some(Piece::Token(token))
                } else {
                    self.pending = Some(token);
                    Some(Piece::Text(literal))
                }
            }
            None => {
                let literal = self.rest;
                self.rest = "";
                Some(Piece::Text(literal))
            }
        }
    }
}
