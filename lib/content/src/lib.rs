//! Message content resolution for the chairside platform.
//!
//! Content for a sequence step comes from a chain of sources: a named
//! template with placeholder substitution, then the external
//! text-generation service, then a fixed default. The chain never fails;
//! every step gets *some* draft, and every draft is human-reviewed before
//! dispatch.

pub mod error;
pub mod generator;
pub mod resolver;
pub mod template;

pub use error::{GenerationError, TemplateError};
pub use generator::{GeneratedText, GenerationRequest, TextGenerator, Urgency};
pub use resolver::{ContentResolver, ContentSource, Rendered, StepContent};
pub use template::{MessageTemplate, TemplateStore};
