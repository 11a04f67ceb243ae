//! Contact records read from the practice data store.
//!
//! A contact is a lead or a patient; the engine reads a unified view of
//! both. The row is owned by the external store: the engine never creates
//! contacts, it only selects audiences from them.

use chairside_core::ContactId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pipeline status of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    /// Just arrived, untouched.
    New,
    /// Staff has reached out at least once.
    Contacted,
    /// Became a patient.
    Converted,
    /// Booked an appointment.
    Booked,
    /// Went cold or withdrew.
    Lost,
}

impl LeadStatus {
    /// Returns the stable wire string for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Converted => "converted",
            Self::Booked => "booked",
            Self::Lost => "lost",
        }
    }

    /// Parses a stored status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "converted" => Some(Self::Converted),
            "booked" => Some(Self::Booked),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }

    /// Returns true once the lead has left the nurture audience.
    #[must_use]
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted | Self::Booked)
    }
}

/// A lead or patient as the engine sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier.
    pub id: ContactId,
    /// First name, used for message personalization.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address, if known.
    pub email: Option<String>,
    /// Phone number, if known.
    pub phone: Option<String>,
    /// Whether the contact has opted out of outreach.
    pub opted_out: bool,
    /// Lead pipeline status; `None` for established patients.
    pub lead_status: Option<LeadStatus>,
    /// Free-text inquiry the lead came in with.
    pub inquiry: Option<String>,
    /// The lead's original message, used as a generation hint.
    pub note: Option<String>,
    /// Date of the last completed visit; `None` for leads.
    pub last_visit: Option<NaiveDate>,
}

impl Contact {
    /// Creates a contact with the given name and nothing else set.
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: ContactId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
            opted_out: false,
            lead_status: None,
            inquiry: None,
            note: None,
            last_visit: None,
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Marks the contact as opted out.
    #[must_use]
    pub fn opted_out(mut self) -> Self {
        self.opted_out = true;
        self
    }

    /// Sets the lead status.
    #[must_use]
    pub fn with_lead_status(mut self, status: LeadStatus) -> Self {
        self.lead_status = Some(status);
        self
    }

    /// Sets the free-text inquiry.
    #[must_use]
    pub fn with_inquiry(mut self, inquiry: impl Into<String>) -> Self {
        self.inquiry = Some(inquiry.into());
        self
    }

    /// Sets the lead's original message.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the last visit date.
    #[must_use]
    pub fn with_last_visit(mut self, date: NaiveDate) -> Self {
        self.last_visit = Some(date);
        self
    }

    /// Full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns true once the contact has converted or booked as a lead.
    #[must_use]
    pub fn has_converted(&self) -> bool {
        self.lead_status.is_some_and(|s| s.is_converted())
    }
}
