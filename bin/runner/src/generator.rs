//! Text-generation wiring.
//!
//! The generation call is an external collaborator; this deployment ships
//! without one, so every step falls through to templates or the fixed
//! fallback. Swapping in a live backend means implementing
//! [`TextGenerator`] and handing it to the resolver in `main`.

use async_trait::async_trait;
use chairside_content::{GeneratedText, GenerationError, GenerationRequest, TextGenerator};

/// A generator that is never available.
pub struct UnconfiguredGenerator;

#[async_trait]
impl TextGenerator for UnconfiguredGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GeneratedText, GenerationError> {
        Err(GenerationError::Unavailable {
            reason: "no text-generation backend configured".to_string(),
        })
    }
}
