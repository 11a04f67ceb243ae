//! Per-category business rules.
//!
//! Each campaign category registers one [`CategoryPolicy`]: its
//! eligibility predicate (who enters the sequence), its resolution check
//! (who has since left the audience), and an optional post-enrollment
//! hook. The scanner and processor only ever walk the registry, so
//! adding a category is a registration, not a new code path.

use crate::store::{AudienceSource, StoreError};
use async_trait::async_trait;
use chairside_sequence::{Category, Contact, InquiryKind, TerminalStatus};
use chrono::{DateTime, Days, Months, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Months without a visit before an active patient is due for recall.
const RECALL_AFTER_MONTHS: u32 = 6;
/// Months without a visit before a patient counts as lapsed.
const LAPSED_AFTER_MONTHS: u32 = 12;
/// How far back the scanner looks for unfollowed no-shows.
const NO_SHOW_WINDOW_DAYS: u64 = 7;

/// One category's business rules.
#[async_trait]
pub trait CategoryPolicy: Send + Sync {
    /// The category this policy governs.
    fn category(&self) -> Category;

    /// Selects a bounded batch of contacts satisfying this category's
    /// eligibility rule. Opt-outs are excluded.
    async fn candidates(
        &self,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError>;

    /// Checks whether the contact has already left this category's
    /// audience (booked, converted), independent of step progress.
    async fn already_resolved(
        &self,
        contact: &Contact,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
    ) -> Result<Option<TerminalStatus>, StoreError>;

    /// Hook run once after a successful enrollment.
    async fn after_enroll(
        &self,
        _contact: &Contact,
        _audience: &dyn AudienceSource,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Shared resolution check for the reactivation family: a booked
/// appointment on or after today means the patient came back.
async fn booked_again(
    contact: &Contact,
    audience: &dyn AudienceSource,
    now: DateTime<Utc>,
) -> Result<Option<TerminalStatus>, StoreError> {
    if audience
        .has_upcoming_appointment(contact.id, now.date_naive())
        .await?
    {
        Ok(Some(TerminalStatus::Reactivated))
    } else {
        Ok(None)
    }
}

/// Active patients overdue for their periodic visit.
pub struct RecallPolicy;

#[async_trait]
impl CategoryPolicy for RecallPolicy {
    fn category(&self) -> Category {
        Category::Recall
    }

    async fn candidates(
        &self,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let cutoff = now
            .date_naive()
            .checked_sub_months(Months::new(RECALL_AFTER_MONTHS))
            .unwrap_or_else(|| now.date_naive());
        audience.recall_candidates(cutoff, limit).await
    }

    async fn already_resolved(
        &self,
        contact: &Contact,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
    ) -> Result<Option<TerminalStatus>, StoreError> {
        booked_again(contact, audience, now).await
    }
}

/// Patients who have drifted away entirely.
pub struct LapsedPolicy;

#[async_trait]
impl CategoryPolicy for LapsedPolicy {
    fn category(&self) -> Category {
        Category::Lapsed
    }

    async fn candidates(
        &self,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let cutoff = now
            .date_naive()
            .checked_sub_months(Months::new(LAPSED_AFTER_MONTHS))
            .unwrap_or_else(|| now.date_naive());
        audience.lapsed_candidates(cutoff, limit).await
    }

    async fn already_resolved(
        &self,
        contact: &Contact,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
    ) -> Result<Option<TerminalStatus>, StoreError> {
        booked_again(contact, audience, now).await
    }
}

/// Recent no-shows without a follow-up yet.
pub struct MissedAppointmentPolicy;

#[async_trait]
impl CategoryPolicy for MissedAppointmentPolicy {
    fn category(&self) -> Category {
        Category::MissedAppointment
    }

    async fn candidates(
        &self,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let since = now
            .date_naive()
            .checked_sub_days(Days::new(NO_SHOW_WINDOW_DAYS))
            .unwrap_or_else(|| now.date_naive());
        audience.no_show_candidates(since, limit).await
    }

    async fn already_resolved(
        &self,
        contact: &Contact,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
    ) -> Result<Option<TerminalStatus>, StoreError> {
        booked_again(contact, audience, now).await
    }

    async fn after_enroll(
        &self,
        contact: &Contact,
        audience: &dyn AudienceSource,
    ) -> Result<(), StoreError> {
        audience.mark_no_show_followed_up(contact.id).await
    }
}

/// Patients with a presented but unaccepted treatment plan.
pub struct IncompleteTreatmentPolicy;

#[async_trait]
impl CategoryPolicy for IncompleteTreatmentPolicy {
    fn category(&self) -> Category {
        Category::IncompleteTreatment
    }

    async fn candidates(
        &self,
        audience: &dyn AudienceSource,
        _now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        audience.open_treatment_plan_candidates(limit).await
    }

    async fn already_resolved(
        &self,
        contact: &Contact,
        audience: &dyn AudienceSource,
        now: DateTime<Utc>,
    ) -> Result<Option<TerminalStatus>, StoreError> {
        booked_again(contact, audience, now).await
    }
}

/// Unconverted leads whose inquiry classifies into this policy's kind.
pub struct NurturePolicy {
    kind: InquiryKind,
}

impl NurturePolicy {
    /// Creates a nurture policy for the given inquiry kind.
    #[must_use]
    pub fn new(kind: InquiryKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl CategoryPolicy for NurturePolicy {
    fn category(&self) -> Category {
        Category::Nurture(self.kind)
    }

    async fn candidates(
        &self,
        audience: &dyn AudienceSource,
        _now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let leads = audience.unconverted_leads(limit).await?;
        Ok(leads
            .into_iter()
            .filter(|lead| InquiryKind::classify(lead.inquiry.as_deref()) == self.kind)
            .collect())
    }

    async fn already_resolved(
        &self,
        contact: &Contact,
        _audience: &dyn AudienceSource,
        _now: DateTime<Utc>,
    ) -> Result<Option<TerminalStatus>, StoreError> {
        if contact.has_converted() {
            Ok(Some(TerminalStatus::Converted))
        } else {
            Ok(None)
        }
    }
}

/// Registry mapping categories to their policies.
pub struct CategoryRegistry {
    policies: Vec<Arc<dyn CategoryPolicy>>,
    by_category: HashMap<Category, usize>,
}

impl CategoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            policies: Vec::new(),
            by_category: HashMap::new(),
        }
    }

    /// Creates a registry with all built-in policies registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RecallPolicy));
        registry.register(Arc::new(LapsedPolicy));
        registry.register(Arc::new(MissedAppointmentPolicy));
        registry.register(Arc::new(IncompleteTreatmentPolicy));
        for kind in InquiryKind::ALL {
            registry.register(Arc::new(NurturePolicy::new(kind)));
        }
        registry
    }

    /// Registers a policy, replacing any existing one for its category.
    pub fn register(&mut self, policy: Arc<dyn CategoryPolicy>) {
        let category = policy.category();
        if let Some(&index) = self.by_category.get(&category) {
            self.policies[index] = policy;
        } else {
            self.by_category.insert(category, self.policies.len());
            self.policies.push(policy);
        }
    }

    /// Gets the policy for a category.
    #[must_use]
    pub fn get(&self, category: Category) -> Option<Arc<dyn CategoryPolicy>> {
        self.by_category
            .get(&category)
            .map(|&index| Arc::clone(&self.policies[index]))
    }

    /// Iterates policies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CategoryPolicy>> {
        self.policies.iter()
    }

    /// Number of registered policies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
