//! Named message templates with placeholder substitution.
//!
//! Templates are plain text with `{{variable}}` tokens, resolved by
//! substitution, not interpretation. Unknown tokens are left in place.

use crate::error::TemplateError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named message template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    /// Lookup name (step definitions reference this).
    pub name: String,
    /// Body with `{{variable}}` tokens.
    pub body: String,
    /// Inactive templates are invisible to the resolver.
    pub active: bool,
}

impl MessageTemplate {
    /// Creates an active template.
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            active: true,
        }
    }

    /// Renders the body with the given variables.
    ///
    /// Variables are substituted using `{{variable_name}}` syntax.
    #[must_use]
    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        let mut result = self.body.clone();
        for (name, value) in variables {
            let placeholder = format!("{{{{{}}}}}", name);
            result = result.replace(&placeholder, value);
        }
        result
    }
}

/// Trait for template storage.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Finds an active template by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails; an inactive or missing
    /// template is `Ok(None)`.
    async fn find_active(&self, name: &str) -> Result<Option<MessageTemplate>, TemplateError>;
}
