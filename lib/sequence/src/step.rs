//! Step definitions: the immutable per-step configuration of a sequence.

use crate::category::Category;
use crate::error::UnknownValueError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Delivery channel(s) for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Sms,
    Email,
    /// Both an SMS and an email are rendered for this step.
    Both,
}

impl Channel {
    /// Whether this step renders an SMS body.
    #[must_use]
    pub fn wants_sms(&self) -> bool {
        matches!(self, Self::Sms | Self::Both)
    }

    /// Whether this step renders an email body.
    #[must_use]
    pub fn wants_email(&self) -> bool {
        matches!(self, Self::Email | Self::Both)
    }

    /// Returns the stable wire string for this channel.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Both => "both",
        }
    }
}

impl FromStr for Channel {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "both" => Ok(Self::Both),
            _ => Err(UnknownValueError::new("channel", s)),
        }
    }
}

/// Configuration for one step of a category's sequence.
///
/// Definitions are keyed by `(category, step_number)` with steps starting
/// at 1, and are immutable at runtime. The delay counts units of the
/// category's [`DelayUnit`](crate::category::DelayUnit) and is measured
/// from the previous step (or from enrollment, for step 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// The sequence this step belongs to.
    pub category: Category,
    /// Position in the sequence, starting at 1.
    pub step_number: u32,
    /// Channel(s) to render for.
    pub channel: Channel,
    /// Delay from the previous step, in the category's unit.
    pub delay: i64,
    /// Named content template to prefer, if one is configured.
    pub template_key: Option<String>,
    /// Subject line for email renditions.
    pub subject_line: Option<String>,
    /// Inactive definitions are invisible to the engine.
    pub active: bool,
}

impl StepDefinition {
    /// Creates an active step definition.
    #[must_use]
    pub fn new(category: Category, step_number: u32, channel: Channel, delay: i64) -> Self {
        Self {
            category,
            step_number,
            channel,
            delay,
            template_key: None,
            subject_line: None,
            active: true,
        }
    }

    /// Sets the template key.
    #[must_use]
    pub fn with_template_key(mut self, key: impl Into<String>) -> Self {
        self.template_key = Some(key.into());
        self
    }

    /// Sets the email subject line.
    #[must_use]
    pub fn with_subject_line(mut self, subject: impl Into<String>) -> Self {
        self.subject_line = Some(subject.into());
        self
    }

    /// The delay as a duration, using the category's unit.
    #[must_use]
    pub fn delay_duration(&self) -> chrono::Duration {
        self.category.delay_unit().duration(self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::InquiryKind;

    #[test]
    fn channel_membership() {
        assert!(Channel::Both.wants_sms());
        assert!(Channel::Both.wants_email());
        assert!(Channel::Sms.wants_sms());
        assert!(!Channel::Sms.wants_email());
        assert!(!Channel::Email.wants_sms());
    }

    #[test]
    fn channel_roundtrip() {
        for channel in [Channel::Sms, Channel::Email, Channel::Both] {
            let parsed: Channel = channel.as_str().parse().expect("should parse");
            assert_eq!(parsed, channel);
        }
        assert!("fax".parse::<Channel>().is_err());
    }

    #[test]
    fn delay_duration_uses_category_unit() {
        let recall = StepDefinition::new(Category::Recall, 1, Channel::Sms, 3);
        assert_eq!(recall.delay_duration(), chrono::Duration::days(3));

        let nurture = StepDefinition::new(
            Category::Nurture(InquiryKind::Cosmetic),
            1,
            Channel::Sms,
            3,
        );
        assert_eq!(nurture.delay_duration(), chrono::Duration::hours(3));
    }
}
