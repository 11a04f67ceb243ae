//! Campaign categories and their sequencing parameters.
//!
//! A category names one kind of outreach sequence. Reactivation categories
//! move on a horizon of days; lead-nurture categories move in hours and are
//! further keyed by the kind of inquiry the lead came in with.

use crate::enrollment::TerminalStatus;
use crate::error::UnknownValueError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Unit for a step's delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayUnit {
    /// Fast-moving lead sequences.
    Hours,
    /// Longer-horizon reactivation sequences.
    Days,
}

impl DelayUnit {
    /// Converts a delay count in this unit into a duration.
    #[must_use]
    pub fn duration(&self, count: i64) -> chrono::Duration {
        match self {
            Self::Hours => chrono::Duration::hours(count),
            Self::Days => chrono::Duration::days(count),
        }
    }
}

/// Kind of inquiry a lead came in with, driving nurture sequence selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InquiryKind {
    Cosmetic,
    Implant,
    Emergency,
    Insurance,
    NewPatient,
    General,
}

impl InquiryKind {
    /// All inquiry kinds, in registration order.
    pub const ALL: [Self; 6] = [
        Self::Cosmetic,
        Self::Implant,
        Self::Emergency,
        Self::Insurance,
        Self::NewPatient,
        Self::General,
    ];

    /// Maps a free-text inquiry onto a kind by keyword.
    ///
    /// Unknown or absent inquiries fall into the general bucket.
    #[must_use]
    pub fn classify(inquiry: Option<&str>) -> Self {
        let Some(inquiry) = inquiry else {
            return Self::General;
        };
        let normalized = inquiry.to_lowercase();
        let has = |needle: &str| normalized.contains(needle);

        if has("cosmetic") || has("whitening") || has("veneer") {
            Self::Cosmetic
        } else if has("implant") {
            Self::Implant
        } else if has("emergency") || has("pain") || has("urgent") {
            Self::Emergency
        } else if has("insurance") || has("coverage") || has("accept") {
            Self::Insurance
        } else if has("new patient") || has("new_patient") || has("first visit") {
            Self::NewPatient
        } else {
            Self::General
        }
    }

    /// Returns the stable wire string for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosmetic => "cosmetic",
            Self::Implant => "implant",
            Self::Emergency => "emergency",
            Self::Insurance => "insurance",
            Self::NewPatient => "new_patient",
            Self::General => "general",
        }
    }
}

/// A named type of outreach sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Active patients overdue for their periodic visit.
    Recall,
    /// Patients who have drifted away entirely.
    Lapsed,
    /// Recent no-shows without a follow-up yet.
    MissedAppointment,
    /// Patients with a presented but unaccepted treatment plan.
    IncompleteTreatment,
    /// Unconverted leads, keyed by inquiry kind.
    Nurture(InquiryKind),
}

impl Category {
    /// All categories, in registration order.
    pub const ALL: [Self; 10] = [
        Self::Recall,
        Self::Lapsed,
        Self::MissedAppointment,
        Self::IncompleteTreatment,
        Self::Nurture(InquiryKind::Cosmetic),
        Self::Nurture(InquiryKind::Implant),
        Self::Nurture(InquiryKind::Emergency),
        Self::Nurture(InquiryKind::Insurance),
        Self::Nurture(InquiryKind::NewPatient),
        Self::Nurture(InquiryKind::General),
    ];

    /// The unit step delays are expressed in for this category.
    #[must_use]
    pub const fn delay_unit(&self) -> DelayUnit {
        match self {
            Self::Nurture(_) => DelayUnit::Hours,
            _ => DelayUnit::Days,
        }
    }

    /// The terminal status an enrollment takes when the contact has
    /// already left this category's audience (booked, converted).
    #[must_use]
    pub const fn resolved_status(&self) -> TerminalStatus {
        match self {
            Self::Nurture(_) => TerminalStatus::Converted,
            _ => TerminalStatus::Reactivated,
        }
    }

    /// Returns true for the lead-nurture family.
    #[must_use]
    pub const fn is_nurture(&self) -> bool {
        matches!(self, Self::Nurture(_))
    }

    /// Returns the stable wire string for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recall => "recall",
            Self::Lapsed => "lapsed",
            Self::MissedAppointment => "missed_appointment",
            Self::IncompleteTreatment => "incomplete_treatment",
            Self::Nurture(InquiryKind::Cosmetic) => "nurture_cosmetic",
            Self::Nurture(InquiryKind::Implant) => "nurture_implant",
            Self::Nurture(InquiryKind::Emergency) => "nurture_emergency",
            Self::Nurture(InquiryKind::Insurance) => "nurture_insurance",
            Self::Nurture(InquiryKind::NewPatient) => "nurture_new_patient",
            Self::Nurture(InquiryKind::General) => "nurture_general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownValueError::new("category", s))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_keyword() {
        assert_eq!(
            InquiryKind::classify(Some("Teeth Whitening quote")),
            InquiryKind::Cosmetic
        );
        assert_eq!(
            InquiryKind::classify(Some("severe tooth PAIN")),
            InquiryKind::Emergency
        );
        assert_eq!(
            InquiryKind::classify(Some("do you accept Delta Dental?")),
            InquiryKind::Insurance
        );
        assert_eq!(
            InquiryKind::classify(Some("first visit for my daughter")),
            InquiryKind::NewPatient
        );
        assert_eq!(InquiryKind::classify(Some("hello")), InquiryKind::General);
        assert_eq!(InquiryKind::classify(None), InquiryKind::General);
    }

    #[test]
    fn delay_units_by_family() {
        assert_eq!(Category::Recall.delay_unit(), DelayUnit::Days);
        assert_eq!(
            Category::Nurture(InquiryKind::Implant).delay_unit(),
            DelayUnit::Hours
        );
        assert_eq!(DelayUnit::Days.duration(3), chrono::Duration::days(3));
        assert_eq!(DelayUnit::Hours.duration(4), chrono::Duration::hours(4));
    }

    #[test]
    fn resolved_status_by_family() {
        assert_eq!(
            Category::Lapsed.resolved_status(),
            TerminalStatus::Reactivated
        );
        assert_eq!(
            Category::Nurture(InquiryKind::General).resolved_status(),
            TerminalStatus::Converted
        );
    }

    #[test]
    fn category_string_roundtrip() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().expect("should parse");
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn category_parse_unknown() {
        let result: Result<Category, _> = "carrier_pigeon".parse();
        assert!(result.is_err());
    }

    #[test]
    fn category_serde_as_string() {
        let json = serde_json::to_string(&Category::MissedAppointment).expect("serialize");
        assert_eq!(json, "\"missed_appointment\"");
        let parsed: Category = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, Category::MissedAppointment);
    }
}
