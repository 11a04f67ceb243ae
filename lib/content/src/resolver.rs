//! The content fallback chain: template, then generation, then a fixed
//! default.
//!
//! Resolution never fails, and each channel of a step is rendered
//! independently: a generator outage while drafting the email variant
//! does not block the SMS variant, and vice versa. The worst outcome is
//! a generic draft, which a human reviews before anything is sent.

use crate::generator::{GenerationRequest, TextGenerator};
use crate::template::TemplateStore;
use chairside_sequence::{Category, Contact, StepDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Where a rendered body came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentSource {
    /// Substituted from a named template.
    Template { key: String },
    /// Drafted by the text-generation service.
    Generated,
    /// The fixed, category-neutral default.
    Fallback,
}

/// One rendered message body with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendered {
    /// The message body.
    pub body: String,
    /// How it was produced.
    pub source: ContentSource,
}

/// Rendered content for one step, per channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepContent {
    /// Short-form body, when the step's channel wants SMS.
    pub sms: Option<Rendered>,
    /// Long-form body, when the step's channel wants email.
    pub email: Option<Rendered>,
}

/// Resolves a step's message content through the fallback chain.
pub struct ContentResolver {
    templates: Arc<dyn TemplateStore>,
    generator: Arc<dyn TextGenerator>,
    fallback: String,
}

impl ContentResolver {
    /// Creates a resolver.
    ///
    /// `fallback` is the fixed, category-neutral default used when both a
    /// template and generation are unavailable.
    #[must_use]
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        generator: Arc<dyn TextGenerator>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            templates,
            generator,
            fallback: fallback.into(),
        }
    }

    /// Renders content for every channel the step targets.
    pub async fn resolve(&self, step: &StepDefinition, contact: &Contact) -> StepContent {
        // The short-form body doubles as the email's last resort, so it
        // is resolved even for email-only steps.
        let base = self.resolve_base(step, contact).await;

        let email = if step.channel.wants_email() {
            Some(self.resolve_email(step, contact, &base).await)
        } else {
            None
        };
        let sms = step.channel.wants_sms().then_some(base);

        StepContent { sms, email }
    }

    /// Template first, then generation, then the fixed default.
    async fn resolve_base(&self, step: &StepDefinition, contact: &Contact) -> Rendered {
        if let Some(key) = &step.template_key {
            match self.templates.find_active(key).await {
                Ok(Some(template)) => {
                    return Rendered {
                        body: template.render(&contact_vars(contact)),
                        source: ContentSource::Template { key: key.clone() },
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(template = %key, error = %e, "template lookup failed, generating instead");
                }
            }
        }

        let request = GenerationRequest::new(contact.display_name(), topic(step.category, contact))
            .with_hint(base_hint(step.category, contact))
            .with_source(source_tag(step.category, "sequence"));

        match self.generator.generate(&request).await {
            Ok(text) => Rendered {
                body: text.content,
                source: ContentSource::Generated,
            },
            Err(e) => {
                tracing::warn!(contact = %contact.id, error = %e, "generation failed, using fallback");
                Rendered {
                    body: self.fallback.clone(),
                    source: ContentSource::Fallback,
                }
            }
        }
    }

    /// Richer long-form variant; reuses the short body when generation is
    /// down.
    async fn resolve_email(
        &self,
        step: &StepDefinition,
        contact: &Contact,
        base: &Rendered,
    ) -> Rendered {
        let hint = format!(
            "Step {} of the {} sequence: {}",
            step.step_number,
            step.category,
            base_hint(step.category, contact)
        );
        let request = GenerationRequest::new(contact.display_name(), topic(step.category, contact))
            .with_hint(hint)
            .with_source(source_tag(step.category, "email"));

        match self.generator.generate(&request).await {
            Ok(text) => Rendered {
                body: text.content,
                source: ContentSource::Generated,
            },
            Err(e) => {
                tracing::warn!(contact = %contact.id, error = %e, "email generation failed, reusing short body");
                base.clone()
            }
        }
    }
}

fn contact_vars(contact: &Contact) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert("first_name".to_string(), contact.first_name.clone());
    vars.insert("last_name".to_string(), contact.last_name.clone());
    vars
}

fn topic(category: Category, contact: &Contact) -> String {
    if category.is_nurture() {
        contact
            .inquiry
            .clone()
            .unwrap_or_else(|| "General Inquiry".to_string())
    } else {
        format!("Reactivation - {category}")
    }
}

fn base_hint(category: Category, contact: &Contact) -> String {
    if category.is_nurture() {
        contact
            .note
            .clone()
            .unwrap_or_else(|| "Follow-up nurture message".to_string())
    } else {
        let last_visit = contact
            .last_visit
            .map_or_else(|| "a while ago".to_string(), |d| d.format("%B %Y").to_string());
        format!("Patient last visited {last_visit}. Write a warm {category} message.")
    }
}

fn source_tag(category: Category, suffix: &str) -> String {
    if category.is_nurture() {
        format!("nurture_{suffix}")
    } else {
        format!("reactivation_{suffix}")
    }
}
