//! Structured response model.
//!
//! Answers are never free prose: a generation produces an ordered sequence
//! of typed, UI-renderable components that a widget can lay out directly.
//! The model here is the contract between the generator, the transport
//! layer, and whatever frontend consumes it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The renderable component kinds a response may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Plain paragraph: greeting, explanation, closing
    Text,
    /// Highlighted block for addresses, phone numbers, office data
    Card,
    /// Warning or error callout, carries a severity
    Alert,
    /// A suggested follow-up the user can tap; carries a payload
    ActionButton,
}

/// Severity of an `alert` component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Success,
    Error,
}

/// One renderable unit of an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiComponent {
    /// What the frontend should render
    pub kind: ComponentKind,

    /// Optional heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The body text; required and non-empty for every kind
    pub content: String,

    /// Only meaningful when `kind == Alert`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertLevel>,

    /// Only meaningful when `kind == ActionButton`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl UiComponent {
    /// A plain text component.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Text,
            title: None,
            content: content.into(),
            severity: None,
            payload: None,
        }
    }

    /// A card component with a heading.
    pub fn card(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: ComponentKind::Card,
            title: Some(title.into()),
            content: content.into(),
            severity: None,
            payload: None,
        }
    }

    /// An alert component with the given severity.
    pub fn alert(content: impl Into<String>, severity: AlertLevel) -> Self {
        Self {
            kind: ComponentKind::Alert,
            title: None,
            content: content.into(),
            severity: Some(severity),
            payload: None,
        }
    }

    /// An action button offering a follow-up; the payload is echoed back
    /// by the frontend when the user taps it.
    pub fn action_button(content: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: ComponentKind::ActionButton,
            title: None,
            content: content.into(),
            severity: None,
            payload: Some(payload),
        }
    }
}

/// Why a decoded response was rejected by [`StructuredResponse::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseValidationError {
    #[error("Response has zero components")]
    EmptyResponse,

    #[error("Component {index} has empty content")]
    EmptyContent { index: usize },
}

/// A complete structured answer: one or more ordered components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub components: Vec<UiComponent>,
}

impl StructuredResponse {
    /// Wrap a component list.
    pub fn new(components: Vec<UiComponent>) -> Self {
        Self { components }
    }

    /// Check the response invariants: at least one component, every
    /// component with non-empty content.
    pub fn validate(&self) -> std::result::Result<(), ResponseValidationError> {
        if self.components.is_empty() {
            return Err(ResponseValidationError::EmptyResponse);
        }
        for (index, component) in self.components.iter().enumerate() {
            if component.content.trim().is_empty() {
                return Err(ResponseValidationError::EmptyContent { index });
            }
        }
        Ok(())
    }
}
