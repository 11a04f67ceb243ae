//! Text-generation collaborator boundary.
//!
//! The engine treats message generation as an opaque external service:
//! it hands over a short context and gets text back, or it doesn't. Any
//! failure here is survivable; callers degrade to a fixed fallback.

use crate::error::GenerationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How pressing the message is, passed through as generation context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// Context handed to the text-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The contact the message addresses.
    pub contact_name: String,
    /// What the message is about (inquiry type, campaign topic).
    pub topic: String,
    /// Free-text hint steering the draft.
    pub hint: String,
    /// Where in the platform the request originated.
    pub source: String,
    /// Urgency of the outreach.
    pub urgency: Urgency,
}

impl GenerationRequest {
    /// Creates a request for the given contact and topic.
    #[must_use]
    pub fn new(contact_name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            contact_name: contact_name.into(),
            topic: topic.into(),
            hint: String::new(),
            source: String::new(),
            urgency: Urgency::Medium,
        }
    }

    /// Sets the steering hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Sets the originating source tag.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the urgency.
    #[must_use]
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }
}

/// Generated text returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedText {
    /// The draft message body.
    pub content: String,
    /// Model or backend identifier that produced it.
    pub model: String,
}

/// Trait for text-generation backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a draft message for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is unavailable or the call fails;
    /// callers must treat this as non-fatal.
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedText, GenerationError>;
}
